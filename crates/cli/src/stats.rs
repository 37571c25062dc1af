//! Run statistics and outcome formatting.

use std::time::Duration;

use contracts::{Outcome, OutcomeStatus, ResultSet};
use dispatcher::HttpResponse;
use observability::DispatchMetricsAggregator;

/// Statistics from a `run` invocation (one or more dispatch rounds)
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Targets submitted per round
    pub targets: usize,

    /// Wall time of the whole run
    pub duration: Duration,

    /// Stopped early by Ctrl+C / SIGTERM
    pub interrupted: bool,

    /// Per-round aggregation
    pub dispatch_metrics: DispatchMetricsAggregator,
}

impl RunStats {
    pub fn new(targets: usize) -> Self {
        Self {
            targets,
            ..Default::default()
        }
    }

    /// Fold one round into the totals
    pub fn record<T>(&mut self, result: &ResultSet<T>) {
        self.dispatch_metrics.update(&result.summary());
    }

    pub fn rounds(&self) -> u64 {
        self.dispatch_metrics.total_dispatches
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.dispatch_metrics.summary();

        println!("\n=== Fanout Statistics ===\n");
        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Targets per round: {}", self.targets);
        println!("   ├─ Rounds: {}", summary.total_dispatches);
        println!("   └─ Interrupted: {}", self.interrupted);

        println!("\n📈 Outcomes");
        println!(
            "   ├─ Collected: {}/{} ({:.2}%)",
            summary.total_collected, summary.total_items, summary.collected_rate
        );
        println!("   ├─ Successes: {}", summary.total_successes);
        println!(
            "   ├─ Failures: {} ({:.2}%)",
            summary.total_failures, summary.failure_rate
        );
        println!("   ├─ Timed-out rounds: {}", summary.timed_out_dispatches);
        println!("   └─ Round duration (ms): {}", summary.duration_ms);

        println!();
    }
}

/// One line per outcome, in arrival order
pub fn format_outcome(outcome: &Outcome<HttpResponse>) -> String {
    let elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0;
    match &outcome.status {
        OutcomeStatus::Success(response) => format!(
            "  ✓ [{}] {} -> {} ({} bytes) in {:.1}ms",
            outcome.position, outcome.item, response.status, response.body_bytes, elapsed_ms
        ),
        OutcomeStatus::Failure(reason) => format!(
            "  ✗ [{}] {} -> {} in {:.1}ms",
            outcome.position, outcome.item, reason, elapsed_ms
        ),
    }
}
