//! Dispatcher 指标收集模块
//!
//! 基于 DispatchSummary 收集和统计分发器的运行指标。

use std::time::Duration;

use contracts::DispatchSummary;
use metrics::{counter, gauge, histogram};

/// 从 DispatchSummary 记录指标
///
/// 每次 dispatch 结束时调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch;
///
/// let results = dispatcher.dispatch(items, timeout).await?;
/// record_dispatch("http_get", &results.summary());
/// ```
pub fn record_dispatch(operation: &str, summary: &DispatchSummary) {
    let op = operation.to_string();

    // dispatch 计数器
    counter!("fanout_dispatches_total", "operation" => op.clone()).increment(1);

    // 超时次数
    if summary.timed_out() {
        counter!("fanout_dispatch_timeouts_total", "operation" => op.clone()).increment(1);
    }

    // 未观测到的结果
    if summary.missing() > 0 {
        counter!("fanout_outcomes_missing_total", "operation" => op.clone())
            .increment(summary.missing() as u64);
    }

    // 收集率
    if summary.expected > 0 {
        histogram!("fanout_dispatch_collected_ratio", "operation" => op.clone())
            .record(summary.collected as f64 / summary.expected as f64);
    }

    // 耗时 (毫秒)
    histogram!("fanout_dispatch_duration_ms", "operation" => op.clone())
        .record(summary.elapsed.as_secs_f64() * 1000.0);

    gauge!("fanout_dispatch_last_items", "operation" => op).set(summary.expected as f64);
}

/// 记录单个 worker 结果
pub fn record_outcome(operation: &str, success: bool, elapsed_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "fanout_outcomes_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "fanout_outcome_latency_ms",
        "operation" => operation.to_string()
    )
    .record(elapsed_ms);
}

/// 记录截止时间到达时被取消的 worker
pub fn record_worker_cancelled(operation: &str) {
    counter!(
        "fanout_workers_cancelled_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// 记录当前存活的 worker 数量
pub fn record_active_workers(operation: &str, active: usize) {
    gauge!(
        "fanout_workers_active",
        "operation" => operation.to_string()
    )
    .set(active as f64);
}

/// 记录前置条件失败的 dispatch
pub fn record_precondition_rejected(operation: &str, reason: &'static str) {
    counter!(
        "fanout_dispatch_rejected_total",
        "operation" => operation.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Dispatch 指标聚合器
///
/// 在内存中聚合多次 dispatch 的指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// 总 dispatch 次数
    pub total_dispatches: u64,

    /// 超时的 dispatch 次数
    pub timed_out_dispatches: u64,

    /// 提交的 item 总数
    pub total_items: u64,

    /// 收集到的结果总数
    pub total_collected: u64,

    /// 成功结果总数
    pub total_successes: u64,

    /// 失败结果总数
    pub total_failures: u64,

    /// dispatch 耗时统计 (毫秒)
    pub duration_stats: DurationStats,
}

impl DispatchMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, summary: &DispatchSummary) {
        self.total_dispatches += 1;
        if summary.timed_out() {
            self.timed_out_dispatches += 1;
        }
        self.total_items += summary.expected as u64;
        self.total_collected += summary.collected as u64;
        self.total_successes += summary.successes as u64;
        self.total_failures += summary.failures as u64;
        self.duration_stats.record(summary.elapsed);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_dispatches: self.total_dispatches,
            timed_out_dispatches: self.timed_out_dispatches,
            total_items: self.total_items,
            total_collected: self.total_collected,
            total_successes: self.total_successes,
            total_failures: self.total_failures,
            collected_rate: percent(self.total_collected, self.total_items),
            failure_rate: percent(self.total_failures, self.total_collected),
            duration_ms: StatsSummary::from(&self.duration_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_dispatches: u64,
    pub timed_out_dispatches: u64,
    pub total_items: u64,
    pub total_collected: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub collected_rate: f64,
    pub failure_rate: f64,
    pub duration_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(
            f,
            "Dispatches: {} ({} timed out)",
            self.total_dispatches, self.timed_out_dispatches
        )?;
        writeln!(
            f,
            "Outcomes collected: {}/{} ({:.2}%)",
            self.total_collected, self.total_items, self.collected_rate
        )?;
        writeln!(
            f,
            "Failures: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Duration (ms): {}", self.duration_ms)?;
        Ok(())
    }
}

/// 耗时统计摘要 (毫秒)
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&DurationStats> for StatsSummary {
    fn from(stats: &DurationStats) -> Self {
        let (min, max) = stats.range_ms().unwrap_or_default();
        Self {
            count: stats.count(),
            min,
            max,
            mean: stats.mean_ms(),
            std_dev: stats.std_dev_ms(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// dispatch 耗时的在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct DurationStats {
    samples: u64,
    mean_ms: f64,
    sq_dev_sum: f64,
    range_ms: Option<(f64, f64)>,
}

impl DurationStats {
    /// 记录一次 dispatch 耗时
    pub fn record(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.samples += 1;
        self.range_ms = Some(match self.range_ms {
            Some((lo, hi)) => (lo.min(ms), hi.max(ms)),
            None => (ms, ms),
        });

        let before = ms - self.mean_ms;
        self.mean_ms += before / self.samples as f64;
        self.sq_dev_sum += before * (ms - self.mean_ms);
    }

    pub fn count(&self) -> u64 {
        self.samples
    }

    pub fn mean_ms(&self) -> f64 {
        self.mean_ms
    }

    /// 样本标准差，少于两个样本时为 0
    pub fn std_dev_ms(&self) -> f64 {
        match self.samples {
            0 | 1 => 0.0,
            n => (self.sq_dev_sum / (n - 1) as f64).sqrt(),
        }
    }

    /// (最小值, 最大值)，无样本时为 None
    pub fn range_ms(&self) -> Option<(f64, f64)> {
        self.range_ms
    }
}
