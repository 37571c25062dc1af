//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DeadlinePolicy, FanoutBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatcher: DispatcherInfo,
    http: HttpInfo,
    targets: Vec<TargetInfo>,
}

#[derive(Serialize)]
struct DispatcherInfo {
    timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_items: Option<usize>,
    deadline_policy: DeadlinePolicy,
}

#[derive(Serialize)]
struct HttpInfo {
    user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_ms: Option<u64>,
    accept_error_status: bool,
    accept_invalid_certs: bool,
}

#[derive(Serialize)]
struct TargetInfo {
    position: usize,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &FanoutBlueprint) -> ConfigInfo {
    let dispatcher = &blueprint.dispatcher;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatcher: DispatcherInfo {
            timeout_ms: dispatcher.timeout_ms,
            max_concurrency: dispatcher.max_concurrency,
            max_items: dispatcher.max_items,
            deadline_policy: dispatcher.deadline_policy,
        },
        http: HttpInfo {
            user_agent: blueprint.http.user_agent.clone(),
            request_timeout_ms: blueprint.http.request_timeout_ms,
            accept_error_status: blueprint.http.accept_error_status,
            accept_invalid_certs: blueprint.http.accept_invalid_certs,
        },
        targets: blueprint
            .targets
            .iter()
            .enumerate()
            .map(|(position, t)| TargetInfo {
                position,
                url: t.url.clone(),
                label: t.label.clone(),
            })
            .collect(),
    }
}

fn print_config_info(blueprint: &FanoutBlueprint) {
    let dispatcher = &blueprint.dispatcher;

    println!("\n=== Fanout Configuration ===\n");
    println!("Version: {:?}", blueprint.version);

    println!("\nDispatcher:");
    println!("  Timeout: {}ms", dispatcher.timeout_ms);
    match dispatcher.max_concurrency {
        Some(max) => println!("  Max concurrency: {}", max),
        None => println!("  Max concurrency: unbounded"),
    }
    if let Some(max) = dispatcher.max_items {
        println!("  Max items: {}", max);
    }
    println!("  Deadline policy: {:?}", dispatcher.deadline_policy);

    println!("\nHTTP:");
    println!("  User-Agent: {}", blueprint.http.user_agent);
    if let Some(ms) = blueprint.http.request_timeout_ms {
        println!("  Request timeout: {}ms", ms);
    }
    println!("  Accept error status: {}", blueprint.http.accept_error_status);
    if blueprint.http.accept_invalid_certs {
        println!("  Accept invalid certs: true");
    }

    println!("\nTargets ({}):", blueprint.targets.len());
    for (i, target) in blueprint.targets.iter().enumerate() {
        match &target.label {
            Some(label) => println!("  [{}] {} ({})", i, target.url, label),
            None => println!("  [{}] {}", i, target.url),
        }
    }

    println!();
}
