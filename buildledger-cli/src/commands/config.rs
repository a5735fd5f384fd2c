//! `buildledger config ...`

use anyhow::{Context, Result};
use buildledger_config::{BuildLedgerConfig, ConfigLoader};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::cli::ConfigCommands;

pub fn run(cmd: &ConfigCommands, config: &BuildLedgerConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Validate { config_file } => validate(config_file),
        ConfigCommands::Generate { output, force } => generate(output, *force),
        ConfigCommands::Show { format } => show(config, format),
    }
}

fn validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

fn generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, BuildLedgerConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {:?}", output);
    println!(
        "🔧 Validate with: buildledger config validate --config-file {:?}",
        output
    );
    Ok(())
}

fn show(config: &BuildLedgerConfig, format: &str) -> Result<()> {
    println!("{}", render(config, format)?);
    Ok(())
}

fn render(config: &BuildLedgerConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => Err(anyhow::anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_then_validate() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("buildledger.yaml");

        generate(&output, false).unwrap();
        assert!(output.exists());
        validate(&output).unwrap();

        // Refuses to overwrite without --force
        assert!(generate(&output, false).is_err());
        generate(&output, true).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "session:\n  idle_timeout: 60\n  warning_lead: 120\n").unwrap();

        assert!(validate(&path).is_err());
    }

    #[test]
    fn test_render_formats() {
        let config = BuildLedgerConfig::default();

        let yaml = render(&config, "yaml").unwrap();
        assert!(yaml.contains("idle_timeout: 1800"));

        let json: serde_json::Value = serde_json::from_str(&render(&config, "JSON").unwrap()).unwrap();
        assert_eq!(json["session"]["warning_lead"], 300);

        assert!(render(&config, "toml").is_err());
    }
}
