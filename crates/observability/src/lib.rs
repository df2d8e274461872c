//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，输出到 stderr)
//! - Prometheus 指标导出
//! - 每个生成步骤的结果与后端延迟统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! // 初始化
//! init_with_config(ObservabilityConfig::default())?;
//!
//! // 记录单个步骤
//! metrics::record_step(StepKind::Analysis, StepOutcome::Succeeded, latency_ms);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_pacing_wait_ms, record_run_completed, record_step, MetricsSummary, RunningStats,
    StatsSummary, StepMetricsAggregator,
};

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别（RUST_LOG 未设置时生效）
    pub default_log_level: String,
    /// 忽略 RUST_LOG，强制使用 `default_log_level`
    pub ignore_env_filter: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            ignore_env_filter: false,
        }
    }
}

impl ObservabilityConfig {
    /// 构造日志过滤器
    pub fn env_filter(&self) -> EnvFilter {
        if self.ignore_env_filter {
            return EnvFilter::new(&self.default_log_level);
        }
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
///
/// 日志写到 stderr，stdout 留给进度输出和报告。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("Failed to install Prometheus recorder")?;

        tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}
