//! Process command - recognize and parse a single receipt image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::api::NO_TEXT_MESSAGE;
use rcpt_core::models::config::{OcrConfig, OcrProviderKind};
use rcpt_core::ocr::{create_provider, OcrOutcome, OcrProvider};
use rcpt_core::receipt::{HeuristicReceiptParser, ReceiptParser};

use super::config::load_config;
use super::parse::{format_receipt, print_warnings, write_output, OutputFormat};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Receipt image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR provider (overrides the config)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Provider API key (overrides the config and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Print the OCR transcript instead of the parsed receipt
    #[arg(long)]
    raw: bool,

    /// Print extraction warnings to stderr
    #[arg(long)]
    warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ProviderArg {
    /// Google Cloud Vision
    GoogleVision,
    /// OCR.space
    OcrSpace,
}

impl From<ProviderArg> for OcrProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::GoogleVision => OcrProviderKind::GoogleVision,
            ProviderArg::OcrSpace => OcrProviderKind::OcrSpace,
        }
    }
}

/// Apply command-line overrides to the OCR config.
pub fn ocr_config(
    mut config: OcrConfig,
    provider: Option<ProviderArg>,
    api_key: Option<String>,
) -> OcrConfig {
    if let Some(provider) = provider {
        let kind = OcrProviderKind::from(provider);
        if kind != config.provider {
            // A configured key env belongs to the configured vendor
            config.api_key_env = None;
            config.api_key = None;
        }
        config.provider = kind;
    }
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    config
}

pub fn is_image(path: &std::path::Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    IMAGE_EXTENSIONS.contains(&extension.as_str())
}

/// Read an image and run it through the provider.
pub async fn recognize_file(
    provider: &dyn OcrProvider,
    path: &std::path::Path,
) -> anyhow::Result<String> {
    let data = fs::read(path)?;
    let encoded = STANDARD.encode(&data);
    debug!("Encoded {} bytes as {} base64 characters", data.len(), encoded.len());

    match provider.recognize(&encoded).await? {
        OcrOutcome::Text(text) => Ok(text),
        OcrOutcome::NoText { debug: payload } => {
            debug!("Provider payload: {}", payload);
            anyhow::bail!("{}", NO_TEXT_MESSAGE)
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_image(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    let ocr = ocr_config(config.ocr, args.provider, args.api_key.clone());
    let provider = create_provider(&ocr)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Running OCR with {}...", ocr.provider.display_name()));

    let text = recognize_file(provider.as_ref(), &args.input).await;
    pb.finish_and_clear();
    let text = text?;

    if args.raw {
        return write_output(&text, args.output.as_ref());
    }

    let parser = HeuristicReceiptParser::new().with_config(config.extraction);
    let result = parser.parse(&text);

    if args.warnings {
        print_warnings(&result);
    }

    let output = format_receipt(&result.receipt, args.format)?;
    write_output(&output, args.output.as_ref())?;

    eprintln!(
        "{} {} items, total {} ({}ms)",
        style("ℹ").blue(),
        result.receipt.items.len(),
        result.receipt.total().to_usd(),
        start.elapsed().as_millis()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_provider_override_resets_foreign_key_env() {
        let config = OcrConfig {
            api_key_env: Some("MY_VISION_KEY".to_string()),
            ..Default::default()
        };
        let ocr = ocr_config(config, Some(ProviderArg::OcrSpace), None);
        assert_eq!(ocr.provider, OcrProviderKind::OcrSpace);
        assert_eq!(ocr.key_env(), "OCR_SPACE_API_KEY");

        let ocr = ocr_config(OcrConfig::default(), None, Some("k".to_string()));
        assert_eq!(ocr.provider, OcrProviderKind::GoogleVision);
        assert_eq!(ocr.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("receipt.JPG")));
        assert!(is_image(Path::new("scans/receipt.webp")));
        assert!(!is_image(Path::new("receipt.txt")));
        assert!(!is_image(Path::new("receipt")));
    }
}
