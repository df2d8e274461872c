//! 管道步骤指标收集模块
//!
//! 记录每个步骤的结果与后端延迟，同时写入 `metrics` facade 和内存聚合器（用于运行结束时的摘要）。

use std::collections::BTreeMap;

use contracts::{StepKind, StepOutcome};
use metrics::{counter, gauge, histogram};

/// 记录一个已完成的步骤
///
/// 每个步骤在后端调用返回（或失败）后调用一次。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_step;
///
/// record_step(StepKind::Analysis, StepOutcome::Succeeded, 812.0);
/// ```
pub fn record_step(step: StepKind, outcome: StepOutcome, latency_ms: f64) {
    counter!(
        "babycast_steps_total",
        "step" => step.label(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!("babycast_backend_latency_ms", "step" => step.label()).record(latency_ms);

    if outcome == StepOutcome::Failed {
        counter!("babycast_step_failures_total").increment(1);
    }
}

/// 记录图像请求前的节流等待时间
pub fn record_pacing_wait_ms(wait_ms: f64) {
    histogram!("babycast_pacing_wait_ms").record(wait_ms);
}

/// 记录一次完整运行
pub fn record_run_completed(slots_filled: usize, duration_ms: f64) {
    counter!("babycast_runs_total").increment(1);
    gauge!("babycast_slots_filled").set(slots_filled as f64);
    histogram!("babycast_run_duration_ms").record(duration_ms);
}

/// 步骤指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct StepMetricsAggregator {
    /// 总步骤数
    pub total_steps: u64,

    /// 拿到预期内容的步骤数
    pub succeeded: u64,

    /// 有响应但无预期内容的步骤数
    pub empty: u64,

    /// 后端调用失败的步骤数
    pub failed: u64,

    /// 后端延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各步骤结果
    pub outcomes: BTreeMap<&'static str, StepOutcome>,
}

impl StepMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, step: StepKind, outcome: StepOutcome, latency_ms: f64) {
        self.total_steps += 1;
        match outcome {
            StepOutcome::Succeeded => self.succeeded += 1,
            StepOutcome::Empty => self.empty += 1,
            StepOutcome::Failed => self.failed += 1,
        }
        self.latency_stats.push(latency_ms);
        self.outcomes.insert(step.label(), outcome);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_steps: self.total_steps,
            succeeded: self.succeeded,
            empty: self.empty,
            failed: self.failed,
            failure_rate: if self.total_steps > 0 {
                (self.failed + self.empty) as f64 / self.total_steps as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            unsuccessful_steps: self
                .outcomes
                .iter()
                .filter(|(_, outcome)| **outcome != StepOutcome::Succeeded)
                .map(|(label, outcome)| (label.to_string(), *outcome))
                .collect(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_steps: u64,
    pub succeeded: u64,
    pub empty: u64,
    pub failed: u64,
    /// 无可用结果的步骤占比 (%)
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub unsuccessful_steps: BTreeMap<String, StepOutcome>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Step Metrics Summary ===")?;
        writeln!(f, "Total steps: {}", self.total_steps)?;
        writeln!(f, "Succeeded: {}", self.succeeded)?;
        writeln!(
            f,
            "Empty: {}, Failed: {} ({:.2}%)",
            self.empty, self.failed, self.failure_rate
        )?;
        writeln!(f, "Backend latency (ms): {}", self.latency_ms)?;

        if !self.unsuccessful_steps.is_empty() {
            writeln!(f, "Unsuccessful steps:")?;
            for (step, outcome) in &self.unsuccessful_steps {
                writeln!(f, "  {}: {}", step, outcome.as_str())?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
