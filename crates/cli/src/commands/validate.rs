//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::PipelineSettings;
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
    model: String,
    endpoint: String,
    api_key_env: String,
    credential_present: bool,
    request_timeout_secs: u64,
    pacing_interval_ms: u64,
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

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(settings) => {
            let credential_present = std::env::var(&settings.backend.api_key_env)
                .map(|key| !key.trim().is_empty())
                .unwrap_or(false);
            let warnings = collect_warnings(&settings, credential_present);

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
                    model: settings.backend.model.clone(),
                    endpoint: settings.backend.endpoint.clone(),
                    api_key_env: settings.backend.api_key_env.clone(),
                    credential_present,
                    request_timeout_secs: settings.backend.request_timeout_secs,
                    pacing_interval_ms: settings.pacing.interval_ms,
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
fn collect_warnings(settings: &PipelineSettings, credential_present: bool) -> Vec<String> {
    let mut warnings = Vec::new();

    if !credential_present {
        warnings.push(format!(
            "Environment variable {} is not set - only --mock runs will work",
            settings.backend.api_key_env
        ));
    }

    if settings.backend.endpoint.starts_with("http://") {
        warnings.push("backend.endpoint uses plain http - the credential is sent unencrypted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Model: {}", summary.model);
            println!("  Endpoint: {}", summary.endpoint);
            println!(
                "  Credential: ${} ({})",
                summary.api_key_env,
                if summary.credential_present { "set" } else { "missing" }
            );
            println!("  Pacing: {} ms", summary.pacing_interval_ms);
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
