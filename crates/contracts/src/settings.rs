//! PipelineSettings - Config Loader 输出
//!
//! 后端连接与请求节流配置。所有字段均有默认值，空配置文件即合法。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 默认多模态模型
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// 默认后端地址
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// 存放后端凭证的环境变量名
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// 每次图像请求前的等待时间
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 500;

/// 节流间隔下限：配置只能延长，不能缩短
pub const MIN_PACING_INTERVAL_MS: u64 = DEFAULT_PACING_INTERVAL_MS;

/// 节流间隔上限
pub const MAX_PACING_INTERVAL_MS: u64 = 60_000;

/// 完整管道配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PipelineSettings {
    #[serde(default)]
    #[validate(nested)]
    pub backend: BackendSettings,

    #[serde(default)]
    #[validate(nested)]
    pub pacing: PacingSettings,
}

/// 生成式后端连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BackendSettings {
    /// 所有请求使用的模型 ID
    #[serde(default = "default_model")]
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,

    /// 后端 API 基础 URL
    #[serde(default = "default_endpoint")]
    #[validate(url(message = "endpoint must be a valid URL"))]
    pub endpoint: String,

    /// 存放 API key 的环境变量名
    #[serde(default = "default_api_key_env")]
    #[validate(length(min = 1, message = "api_key_env must not be empty"))]
    pub api_key_env: String,

    /// 单次 HTTP 请求超时（秒），0 = 由后端决定
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: 0,
        }
    }
}

/// 请求节流配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PacingSettings {
    /// 每次图像请求前的等待时间（毫秒）
    #[serde(default = "default_interval_ms")]
    #[validate(range(
        min = 500,
        max = 60000,
        message = "interval_ms must be between 500 and 60000"
    ))]
    pub interval_ms: u64,
}

impl PacingSettings {
    /// 实际等待时间，未经校验的配置也不会低于下限
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_PACING_INTERVAL_MS))
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_interval_ms() -> u64 {
    DEFAULT_PACING_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.backend.model, DEFAULT_MODEL);
        assert_eq!(settings.pacing.interval(), Duration::from_millis(500));
        assert!(settings.backend.request_timeout().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let settings: PipelineSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    fn test_derive_validation_rejects_bad_values() {
        let mut settings = PipelineSettings::default();
        settings.backend.endpoint = "not a url".into();
        settings.pacing.interval_ms = MAX_PACING_INTERVAL_MS + 1;
        let errors = settings.validate().unwrap_err();
        let text = errors.to_string();
        assert!(text.contains("endpoint"), "{text}");
        assert!(text.contains("interval_ms"), "{text}");
    }

    #[test]
    fn test_pacing_interval_cannot_be_shortened() {
        for interval_ms in [0, 1, MIN_PACING_INTERVAL_MS - 1] {
            let pacing = PacingSettings { interval_ms };
            assert!(pacing.validate().is_err(), "interval_ms = {interval_ms}");
            assert_eq!(pacing.interval(), Duration::from_millis(MIN_PACING_INTERVAL_MS));
        }

        let longer = PacingSettings { interval_ms: 1500 };
        assert!(longer.validate().is_ok());
        assert_eq!(longer.interval(), Duration::from_millis(1500));
    }
}
