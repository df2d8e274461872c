//! 请求节流
//!
//! 每次图像请求前固定等待一段时间，避免触发后端限流。

use std::time::Duration;

use contracts::PacingSettings;
use observability::record_pacing_wait_ms;
use tokio::time::Instant;
use tracing::trace;

/// 固定间隔节流器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    /// 直接指定间隔（不做下限约束，配置路径请用 `from_settings`）
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// 从配置构造，间隔不低于 `MIN_PACING_INTERVAL_MS`
    pub fn from_settings(settings: &PacingSettings) -> Self {
        Self::new(settings.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 等待一个间隔
    pub async fn wait(&self) {
        let started = Instant::now();
        tokio::time::sleep(self.interval).await;
        let waited_ms = started.elapsed().as_secs_f64() * 1000.0;

        trace!(waited_ms, "Pacing delay elapsed");
        record_pacing_wait_ms(waited_ms);
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_settings(&PacingSettings::default())
    }
}
