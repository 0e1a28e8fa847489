//! Config command - inspect and edit the JSON configuration file.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use penscore_core::PenscoreConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value, e.g. "server.port"
    Get { key: String },

    /// Change one value, e.g. `set storage.upload_dir /srv/uploads`
    Set { key: String, value: String },

    /// Print where the configuration file lives
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = resolve_path(config_path);

    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                println!("{} No config file found, showing defaults.", style("ℹ").blue());
            }
            let config = load_or_default(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            save(&PenscoreConfig::default(), &path)?;
            println!("{} Created configuration file at {}", style("✓").green(), path.display());
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_or_default(&path)?)?;
            println!("{}", serde_json::to_string_pretty(lookup(&json, &key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let parsed = parse_value(&value);
            let mut json = serde_json::to_value(load_or_default(&path)?)?;
            assign(&mut json, &key, parsed.clone())?;

            let config: PenscoreConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            save(&config, &path)?;

            println!("{} Set {} = {}", style("✓").green(), key, parsed);
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!();
                println!("Run 'penscore config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

/// Default location: `<config dir>/penscore/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("penscore")
        .join("config.json")
}

pub fn resolve_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the file at `path`, falling back to defaults when it does not exist.
pub fn load_or_default(path: &Path) -> anyhow::Result<PenscoreConfig> {
    if path.exists() {
        Ok(PenscoreConfig::from_file(path)?)
    } else {
        Ok(PenscoreConfig::default())
    }
}

fn save(config: &PenscoreConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    config.save(path)?;
    Ok(())
}

/// JSON if it parses, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

fn assign(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent, field) = match key.rsplit_once('.') {
        Some((parent, field)) => (parent, field),
        None => anyhow::bail!("Configuration keys have the form <section>.<field>: {}", key),
    };

    let mut current = json;
    for part in parent.split('.') {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    let section = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path: {}", parent))?;
    if !section.contains_key(field) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    section.insert(field.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let json = serde_json::to_value(PenscoreConfig::default()).unwrap();

        assert_eq!(lookup(&json, "server.port").unwrap(), &json!(5000));
        assert_eq!(
            lookup(&json, "storage.upload_dir").unwrap(),
            &json!("static/uploads")
        );
        assert!(lookup(&json, "server.nope").is_err());
    }

    #[test]
    fn test_assign_known_keys_only() {
        let mut json = serde_json::to_value(PenscoreConfig::default()).unwrap();

        assign(&mut json, "server.port", parse_value("8080")).unwrap();
        let config: PenscoreConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(config.server.port, 8080);

        assert!(assign(&mut json, "server.colour", json!("red")).is_err());
        assert!(assign(&mut json, "port", json!(1)).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("/srv/uploads"), json!("/srv/uploads"));
    }
}
