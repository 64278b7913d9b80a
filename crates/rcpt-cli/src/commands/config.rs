//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "extraction.max_item_price")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key),
        ConfigCommand::Set { key, value } => set_config(&key, &value),
        ConfigCommand::Path => show_path(),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load the configuration for a command.
///
/// An explicit `--config` path must exist. Otherwise the default location is
/// used when present, and built-in defaults when not.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!("Loading config from {}", path.display());
        return Ok(RcptConfig::from_file(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(RcptConfig::from_file(&default_path)?)
    } else {
        Ok(RcptConfig::default())
    }
}

fn show_config() -> anyhow::Result<()> {
    let config_path = default_config_path();

    let config = if config_path.exists() {
        RcptConfig::from_file(&config_path)?
    } else {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
        RcptConfig::default()
    };

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    RcptConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

/// Look up a dotted key in the JSON form of the config.
fn lookup<'a>(json: &'a serde_json::Value, key: &str) -> anyhow::Result<&'a serde_json::Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Set a dotted key in the JSON form of the config.
fn assign(json: &mut serde_json::Value, key: &str, value: serde_json::Value) -> anyhow::Result<()> {
    let (parent, field) = match key.rsplit_once('.') {
        Some((parent, field)) => (Some(parent), field),
        None => (None, key),
    };

    let mut current = json;
    if let Some(parent) = parent {
        for part in parent.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
        }
    }

    match current.as_object_mut() {
        Some(obj) => {
            obj.insert(field.to_string(), value);
            Ok(())
        }
        None => anyhow::bail!("Cannot set value at non-object path"),
    }
}

fn get_config(key: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();

    let config = if config_path.exists() {
        RcptConfig::from_file(&config_path)?
    } else {
        RcptConfig::default()
    };

    let json = serde_json::to_value(&config)?;
    println!("{}", serde_json::to_string_pretty(lookup(&json, key)?)?);

    Ok(())
}

fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();

    let config = if config_path.exists() {
        RcptConfig::from_file(&config_path)?
    } else {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        RcptConfig::default()
    };

    // Bare words are taken as strings
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let mut json = serde_json::to_value(&config)?;
    assign(&mut json, key, parsed_value.clone())?;

    let config: RcptConfig = serde_json::from_value(json)?;
    config.save(&config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let config_path = default_config_path();

    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'rcpt config init' to create a configuration file.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_and_assign() {
        let mut value = serde_json::to_value(RcptConfig::default()).unwrap();
        assert_eq!(lookup(&value, "extraction.quantity_lookahead").unwrap(), &json!(5));
        assert!(lookup(&value, "extraction.nope").is_err());

        assign(&mut value, "extraction.quantity_lookahead", json!(3)).unwrap();
        assign(&mut value, "ocr.provider", json!("ocr_space")).unwrap();
        assert!(assign(&mut value, "missing.key", json!(1)).is_err());

        let config: RcptConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.extraction.quantity_lookahead, 3);
        assert_eq!(
            config.ocr.provider,
            rcpt_core::models::config::OcrProviderKind::OcrSpace
        );
    }

    #[test]
    fn test_set_brand_marker_to_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut value = serde_json::to_value(RcptConfig::default()).unwrap();
        assign(&mut value, "extraction.brand_marker", serde_json::Value::Null).unwrap();
        let config: RcptConfig = serde_json::from_value(value).unwrap();
        config.save(&path).unwrap();

        let loaded = load_config(path.to_str()).unwrap();
        assert_eq!(loaded.extraction.brand_marker, None);
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"bind": "0.0.0.0:9000"}}"#).unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.route, "/process-receipt");

        assert!(load_config(Some("/definitely/not/here.json")).is_err());
    }
}
