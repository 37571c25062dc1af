//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DeadlinePolicy, FanoutBlueprint};
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
    timeout_ms: u64,
    deadline_policy: DeadlinePolicy,
    target_count: usize,
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
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
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
                    version: format!("{:?}", blueprint.version),
                    timeout_ms: blueprint.dispatcher.timeout_ms,
                    deadline_policy: blueprint.dispatcher.deadline_policy,
                    target_count: blueprint.targets.len(),
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
fn collect_warnings(blueprint: &FanoutBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.targets.is_empty() {
        warnings.push("No targets configured - `run` will need --url".to_string());
    }

    for target in &blueprint.targets {
        if !target.url.starts_with("http://") && !target.url.starts_with("https://") {
            warnings.push(format!(
                "Target '{}' is not an http(s) URL - it will fail validation at dispatch",
                target.url
            ));
        }
    }

    if let Some(request_ms) = blueprint.http.request_timeout_ms {
        if request_ms >= blueprint.dispatcher.timeout_ms {
            warnings.push(format!(
                "http.request_timeout_ms ({}) is not below dispatcher.timeout_ms ({}) - \
                 slow requests will be cut by the deadline instead",
                request_ms, blueprint.dispatcher.timeout_ms
            ));
        }
    }

    if blueprint.dispatcher.deadline_policy == DeadlinePolicy::Abandon
        && blueprint.http.request_timeout_ms.is_none()
    {
        warnings.push(
            "deadline_policy = \"abandon\" without http.request_timeout_ms - \
             late requests may run unbounded"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Timeout: {}ms", summary.timeout_ms);
            println!("  Deadline policy: {:?}", summary.deadline_policy);
            println!("  Targets: {}", summary.target_count);
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
