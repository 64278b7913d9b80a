//! Batch processing command for multiple transcripts and images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use rcpt_core::models::config::RcptConfig;
use rcpt_core::ocr::{create_provider, OcrProvider};
use rcpt_core::receipt::{ExtractionResult, HeuristicReceiptParser, ReceiptParser};

use super::config::load_config;
use super::parse::{format_receipt, OutputFormat};
use super::process::{is_image, ocr_config, recognize_file, ProviderArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR provider for images (overrides the config)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Provider API key (overrides the config and environment)
    #[arg(long)]
    api_key: Option<String>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

fn is_transcript(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_transcript(p) || is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Only images need a provider
    let provider = if files.iter().any(|p| is_image(p)) {
        let ocr = ocr_config(config.ocr.clone(), args.provider, args.api_key.clone());
        Some(create_provider(&ocr)?)
    } else {
        None
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let parser = HeuristicReceiptParser::new().with_config(config.extraction.clone());
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &parser, provider.as_deref(), &config).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(extraction) => results.push(FileResult {
                path,
                extraction: Some(extraction),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.extraction.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(extraction) = &result.extraction else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipt");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_receipt(&extraction.receipt, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
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

async fn process_single_file(
    path: &Path,
    parser: &HeuristicReceiptParser,
    provider: Option<&dyn OcrProvider>,
    config: &RcptConfig,
) -> anyhow::Result<ExtractionResult> {
    let text = if is_transcript(path) {
        fs::read_to_string(path)?
    } else {
        let Some(provider) = provider else {
            anyhow::bail!("No OCR provider configured for {}", path.display());
        };
        debug!(
            "Recognizing {} with {}",
            path.display(),
            config.ocr.provider.display_name()
        );
        recognize_file(provider, path).await?
    };

    Ok(parser.parse(&text))
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let processed_at = Local::now().to_rfc3339();

    wtr.write_record([
        "filename",
        "status",
        "store",
        "date",
        "items",
        "subtotal",
        "tax",
        "total",
        "warnings",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let record = match &result.extraction {
            Some(extraction) => {
                let receipt = &extraction.receipt;
                [
                    filename,
                    "success".to_string(),
                    receipt.store.clone().unwrap_or_default(),
                    receipt.date.clone().unwrap_or_default(),
                    receipt.items.len().to_string(),
                    receipt.subtotal().map(|m| m.to_fixed()).unwrap_or_default(),
                    receipt.tax().map(|m| m.to_fixed()).unwrap_or_default(),
                    receipt.total().to_fixed(),
                    extraction.warnings.join("; "),
                    result.processing_time_ms.to_string(),
                    processed_at.clone(),
                    String::new(),
                ]
            }
            None => [
                filename,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                result.processing_time_ms.to_string(),
                processed_at.clone(),
                result.error.clone().unwrap_or_default(),
            ],
        };
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let parser = HeuristicReceiptParser::new();

        let results = vec![
            FileResult {
                path: PathBuf::from("a.txt"),
                extraction: Some(parser.parse("Joe's Diner\n1x Coffee\n$3.50\nTotal $3.50")),
                error: None,
                processing_time_ms: 1,
            },
            FileResult {
                path: PathBuf::from("b.jpg"),
                extraction: None,
                error: Some("boom".to_string()),
                processing_time_ms: 2,
            },
        ];
        write_summary(&path, &results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("filename,status,store"));
        assert!(
            lines[1].starts_with("a.txt,success,Joe's Diner,,1,,,3.50,Could not extract date,1,")
        );
        assert!(lines[2].starts_with("b.jpg,error,"));
        assert!(lines[2].ends_with(",boom"));
    }

    #[test]
    fn test_is_transcript() {
        assert!(is_transcript(Path::new("r.txt")));
        assert!(is_transcript(Path::new("r.TXT")));
        assert!(!is_transcript(Path::new("r.png")));
    }
}
