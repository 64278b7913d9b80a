//! CLI application for receipt OCR processing.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, parse, process, serve};

/// Receipt OCR - Turn receipt photos and transcripts into structured data
#[derive(Parser)]
#[command(name = "rcpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an OCR transcript without calling a provider
    Parse(parse::ParseArgs),

    /// Recognize and parse a single receipt image
    Process(process::ProcessArgs),

    /// Process multiple transcripts and images
    Batch(batch::BatchArgs),

    /// Serve the receipt endpoint over HTTP
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Parse(args) => parse::run(args, cli.config.as_deref()).await,
        Commands::Process(args) => process::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Serve(args) => serve::run(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args).await,
    }
}
