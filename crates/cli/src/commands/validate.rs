//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    duration_secs: f64,
    tick_hz: f64,
    dropout_count: usize,
    output_dir: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(profile) => {
            let warnings = collect_warnings(&profile);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", profile.version),
                    duration_secs: profile.simulation.duration_secs,
                    tick_hz: profile.simulation.tick_hz,
                    dropout_count: profile.simulation.dropouts.len(),
                    output_dir: profile.storage.output_dir.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(profile: &contracts::LinkProfile) -> Vec<String> {
    let mut warnings = Vec::new();

    // Without fallback copies nothing crosses weak/disconnected phases
    if profile.simulation.fallback_every_ticks == 0 {
        warnings.push(
            "simulation.fallback_every_ticks is 0 - no durable fallback copies will be sent"
                .to_string(),
        );
    }

    if profile.simulation.dropouts.is_empty() {
        warnings.push(
            "No dropout windows configured - the demo will run at full link strength".to_string(),
        );
    }

    if profile.session.frame_timeout_secs <= 1.0 / profile.simulation.tick_hz {
        warnings.push(format!(
            "session.frame_timeout_secs ({}) is at or below the tick period - every gap will time out",
            profile.session.frame_timeout_secs
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Duration: {}s", summary.duration_secs);
            println!("  Tick rate: {} Hz", summary.tick_hz);
            println!("  Dropout windows: {}", summary.dropout_count);
            println!("  Output dir: {}", summary.output_dir);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
