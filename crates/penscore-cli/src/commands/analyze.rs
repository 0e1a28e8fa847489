//! Analyze command - score a single handwriting image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use penscore_core::models::report::join_weak_areas;
use penscore_core::uploads::PROCESSED_PREFIX;
use penscore_core::{Analysis, Analyzer, Language};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image of a handwriting sample
    #[arg(required = true)]
    input: PathBuf,

    /// Script of the sample (english, devanagari, hindi, marathi)
    #[arg(short, long, default_value = "english", value_parser = parse_language)]
    language: Language,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write the binarised image next to the input
    #[arg(long)]
    save_processed: bool,

    /// Include raw feature measurements in text output
    #[arg(long)]
    features: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn parse_language(value: &str) -> Result<Language, String> {
    value.parse().map_err(|e: penscore_core::error::AnalysisError| e.to_string())
}

pub async fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analysing {} as {}", args.input.display(), args.language);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Scoring handwriting...");

    let analyzer = Analyzer::new();
    let analysis = if args.save_processed {
        let processed = processed_path(&args.input);
        let analysis = analyzer.analyze_file(&args.input, &processed, args.language)?;
        pb.println(format!(
            "{} Processed image written to {}",
            style("✓").green(),
            processed.display()
        ));
        analysis
    } else {
        let image = image::open(&args.input)?;
        analyzer.analyze(&image, args.language)
    };

    pb.finish_and_clear();

    let output = format_analysis(&analysis, args.format, args.features)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total time: {:?}", start.elapsed());
    Ok(())
}

fn processed_path(input: &std::path::Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample.png".to_string());
    input.with_file_name(format!("{PROCESSED_PREFIX}{name}"))
}

pub fn format_analysis(
    analysis: &Analysis,
    format: OutputFormat,
    with_features: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        OutputFormat::Csv => format_csv(analysis),
        OutputFormat::Text => Ok(format_text(analysis, with_features)),
    }
}

/// Header row for a script: language, its three traits, overall, weak areas.
pub fn csv_header(language: Language) -> Vec<String> {
    let mut header = vec!["language".to_string()];
    header.extend(language.criteria().iter().map(|c| c.as_str().to_string()));
    header.push("overall".to_string());
    header.push("weak_areas".to_string());
    header
}

pub fn csv_row(analysis: &Analysis) -> Vec<String> {
    let assessment = &analysis.assessment;
    let mut row = vec![analysis.language.as_str().to_string()];
    row.extend(
        assessment
            .scores
            .entries()
            .iter()
            .map(|(_, v)| format!("{:.1}", v)),
    );
    row.push(format!("{:.1}", assessment.overall));
    row.push(join_weak_areas(&assessment.weak_areas));
    row
}

fn format_csv(analysis: &Analysis) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(csv_header(analysis.language))?;
    wtr.write_record(csv_row(analysis))?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(analysis: &Analysis, with_features: bool) -> String {
    let assessment = &analysis.assessment;
    let mut output = String::new();

    output.push_str(&format!("Script: {}\n\n", analysis.language.display_name()));

    output.push_str("Scores:\n");
    for (criterion, value) in assessment.scores.entries() {
        output.push_str(&format!("  {:<12} {:>5.1}%\n", criterion.label(), value));
    }
    output.push_str(&format!("  {:<12} {:>5.1}%\n", "Overall", assessment.overall));

    if with_features {
        output.push_str("\nFeatures:\n");
        for (name, value) in analysis.features.entries() {
            output.push_str(&format!("  {:<20} {:.3}\n", name, value));
        }
    }

    output.push_str("\nFeedback:\n");
    for line in &assessment.feedback {
        output.push_str(&format!("  - {}\n", line));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn blank_analysis(language: Language) -> Analysis {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            60,
            40,
            image::Rgb([255, 255, 255]),
        ));
        Analyzer::new().analyze(&page, language)
    }

    #[test]
    fn test_csv_columns_follow_script() {
        assert_eq!(
            csv_header(Language::Devanagari),
            vec!["language", "shirorekha", "matra", "samanta", "overall", "weak_areas"]
        );

        let analysis = blank_analysis(Language::Devanagari);
        let csv = format_csv(&analysis).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("language,shirorekha,matra,samanta,overall,weak_areas"));
        assert!(lines.next().unwrap().starts_with("devanagari,0.0,0.0,100.0,33.3,"));
    }

    #[test]
    fn test_text_output() {
        let analysis = blank_analysis(Language::English);
        let text = format_text(&analysis, true);

        assert!(text.starts_with("Script: English"));
        assert!(text.contains("Neatness"));
        assert!(text.contains("avg_spacing"));
        assert!(text.contains("Feedback:"));
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(parse_language("Hindi"), Ok(Language::Devanagari));
        assert!(parse_language("tamil").is_err());
    }

    #[test]
    fn test_processed_path() {
        assert_eq!(
            processed_path(std::path::Path::new("scans/page 1.png")),
            PathBuf::from("scans/processed_page 1.png")
        );
    }
}
