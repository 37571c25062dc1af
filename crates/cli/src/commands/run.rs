//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{DeadlinePolicy, FanoutBlueprint, ResultSet, TargetConfig};
use dispatcher::{create_dispatcher, HttpOperation, HttpResponse};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::stats::{format_outcome, RunStats};

/// Operation name used for logs and metrics labels
const OPERATION_NAME: &str = "http_get";

/// One dispatch round for JSON output
#[derive(Serialize)]
struct RoundReport<'a> {
    round: u32,
    result: &'a ResultSet<HttpResponse>,
}

/// Execute the `run` command
pub async fn run_dispatch(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    info!(
        targets = blueprint.targets.len(),
        timeout_ms = blueprint.dispatcher.timeout_ms,
        max_concurrency = ?blueprint.dispatcher.max_concurrency,
        deadline_policy = ?blueprint.dispatcher.deadline_policy,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let operation = HttpOperation::from_config(OPERATION_NAME, &blueprint.http)
        .map_err(CliError::from)?;
    let dispatcher =
        create_dispatcher(operation, blueprint.dispatcher.clone()).map_err(CliError::from)?;

    let items = blueprint.work_items();
    let timeout = blueprint.dispatcher.timeout();
    let mut stats = RunStats::new(items.len());
    let started = Instant::now();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    for round in 1..=args.repeat.max(1) {
        tokio::select! {
            result = dispatcher.dispatch(items.clone(), timeout) => {
                let result = result.map_err(CliError::from)?;
                print_round(round, &result, args.json)?;
                stats.record(&result);
            }
            _ = &mut shutdown => {
                warn!(round, "Received shutdown signal, abandoning dispatch");
                stats.interrupted = true;
                break;
            }
        }
    }

    stats.duration = started.elapsed();
    if !args.json {
        stats.print_summary();
    }

    info!(
        rounds = stats.rounds(),
        interrupted = stats.interrupted,
        "Fanout finished"
    );
    Ok(())
}

/// Load the configuration file (if any) and apply CLI overrides
pub(crate) fn resolve_blueprint(args: &RunArgs) -> Result<FanoutBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => FanoutBlueprint::default(),
    };

    blueprint
        .targets
        .extend(args.urls.iter().map(TargetConfig::new));

    if let Some(timeout_ms) = args.timeout_ms {
        info!(timeout_ms, "Overriding timeout from CLI");
        blueprint.dispatcher.timeout_ms = timeout_ms;
    }
    if let Some(max) = args.max_concurrency {
        info!(max_concurrency = max, "Overriding concurrency limit from CLI");
        blueprint.dispatcher.max_concurrency = Some(max);
    }
    if args.abandon {
        blueprint.dispatcher.deadline_policy = DeadlinePolicy::Abandon;
    }

    config_loader::ConfigLoader::validate(&blueprint).context("Invalid configuration")?;

    if blueprint.targets.is_empty() {
        return Err(CliError::NoTargets.into());
    }

    Ok(blueprint)
}

fn print_round(round: u32, result: &ResultSet<HttpResponse>, json: bool) -> Result<()> {
    if json {
        let report = RoundReport { round, result };
        let line = serde_json::to_string(&report).context("Failed to serialize outcomes")?;
        println!("{}", line);
        return Ok(());
    }

    println!(
        "\n--- Round {} ({}/{} outcomes in {:.1}ms) ---",
        round,
        result.len(),
        result.expected(),
        result.elapsed().as_secs_f64() * 1000.0
    );
    for outcome in result {
        println!("{}", format_outcome(outcome));
    }
    if result.timed_out() {
        println!("  ⏱ {} target(s) did not answer before the deadline", result.missing());
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
