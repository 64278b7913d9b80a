//! Parse command - extract a receipt from an OCR transcript.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use rcpt_core::models::receipt::Receipt;
use rcpt_core::receipt::{ExtractionResult, HeuristicReceiptParser, ReceiptParser};

use super::config::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Transcript file, or `-` for stdin
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print extraction warnings to stderr
    #[arg(long)]
    warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per item and summary row
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

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = if args.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        let path = PathBuf::from(&args.input);
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        info!("Parsing transcript: {}", path.display());
        fs::read_to_string(&path)?
    };

    let parser = HeuristicReceiptParser::new().with_config(config.extraction);
    let result = parser.parse(&text);
    debug!("Parsed in {}ms", result.processing_time_ms);

    if args.warnings {
        print_warnings(&result);
    }

    let output = format_receipt(&result.receipt, args.format)?;
    write_output(&output, args.output.as_ref())
}

pub fn print_warnings(result: &ExtractionResult) {
    if result.warnings.is_empty() {
        return;
    }
    eprintln!("{}", style("Warnings:").yellow());
    for warning in &result.warnings {
        eprintln!("  - {}", warning);
    }
}

pub fn write_output(output: &str, path: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(output_path) = path {
        fs::write(output_path, output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }
    Ok(())
}

pub fn format_receipt(receipt: &Receipt, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt),
        OutputFormat::Text => Ok(format_text(receipt)),
    }
}

fn format_csv(receipt: &Receipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["item", "quantity", "unit_price", "line_total"])?;

    for item in &receipt.items {
        wtr.write_record([
            item.name.clone(),
            item.quantity.to_string(),
            item.unit_price.to_fixed(),
            item.line_total.to_fixed(),
        ])?;
    }

    for row in &receipt.summary_rows {
        let total = row.line_total.to_fixed();
        wtr.write_record([row.label.as_str(), "", "", total.as_str()])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(receipt: &Receipt) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Store: {}\n",
        receipt.store.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("Date:  {}\n", receipt.date.as_deref().unwrap_or("-")));
    output.push('\n');

    if receipt.items.is_empty() {
        output.push_str("No items found\n");
    } else {
        output.push_str("Items:\n");
        for item in &receipt.items {
            output.push_str(&format!(
                "  {:<30} {:>3} x {:>9} {:>10}\n",
                item.name,
                item.quantity,
                item.unit_price.to_usd(),
                item.line_total.to_usd()
            ));
        }
    }
    output.push('\n');

    for row in &receipt.summary_rows {
        output.push_str(&format!(
            "  {:<46} {:>10}\n",
            row.label.as_str(),
            row.line_total.to_usd()
        ));
    }

    output
}
