//! Batch command - score every image matching a glob pattern.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use penscore_core::{Analysis, Analyzer, Language};

use super::analyze::{csv_header, csv_row, format_analysis, parse_language, OutputFormat};

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern, e.g. "scans/*.jpg"
    #[arg(required = true)]
    input: String,

    /// Script of the samples
    #[arg(short, long, default_value = "english", value_parser = parse_language)]
    language: Language,

    /// Directory for one result file per image
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Format of the per-image result files
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Keep going when an image cannot be scored
    #[arg(long)]
    continue_on_error: bool,
}

struct FileResult {
    path: PathBuf,
    analysis: Option<Analysis>,
    error: Option<String>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub async fn run(args: BatchArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    println!("{} Found {} images to score", style("ℹ").blue(), files.len());

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")?
            .progress_chars("=>-"),
    );

    let analyzer = Analyzer::new();
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match image::open(&path) {
            Ok(image) => {
                let analysis = analyzer.analyze(&image, args.language);
                results.push(FileResult {
                    path,
                    analysis: Some(analysis),
                    error: None,
                });
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to score {}: {}", path.display(), e);
                results.push(FileResult {
                    path,
                    analysis: None,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => {
                error!("Failed to score {}: {}", path.display(), e);
                anyhow::bail!("Scoring {} failed: {}", path.display(), e);
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(analysis) = &result.analysis else {
                continue;
            };
            let stem = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("sample");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            fs::write(&output_path, format_analysis(analysis, args.format, true)?)?;
            debug!("Wrote {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, args.language, &results)?;
        println!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Scored {} images in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, language: Language, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename".to_string(), "status".to_string()];
    header.extend(csv_header(language));
    header.push("processing_time_ms".to_string());
    header.push("error".to_string());
    wtr.write_record(&header)?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let mut record = vec![filename];
        match &result.analysis {
            Some(analysis) => {
                record.push("success".to_string());
                record.extend(csv_row(analysis));
                record.push(analysis.processing_time_ms.to_string());
                record.push(String::new());
            }
            None => {
                record.push("error".to_string());
                record.push(language.as_str().to_string());
                record.extend(std::iter::repeat_n(String::new(), header.len() - 4));
                record.push(result.error.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
