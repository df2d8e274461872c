//! 配置验证模块
//!
//! 验证规则：
//! - `PipelineSettings` 上的 derive 规则（非空字符串、URL、节流间隔 500..=60000）
//! - model 必须是单段标识符（不含路径分隔符和空白）
//! - endpoint 必须是 http 或 https
//! - api_key_env 必须是合法的环境变量名

use contracts::{ContractError, PipelineSettings};
use validator::Validate;

/// 验证 PipelineSettings
///
/// 返回第一个遇到的错误，或 Ok(())
pub fn validate(settings: &PipelineSettings) -> Result<(), ContractError> {
    validate_derived(settings)?;
    validate_model(settings)?;
    validate_endpoint(settings)?;
    validate_api_key_env(settings)?;
    Ok(())
}

/// 配置结构体上声明的字段规则
fn validate_derived(settings: &PipelineSettings) -> Result<(), ContractError> {
    settings.validate().map_err(|errors| {
        ContractError::config_validation("settings", errors.to_string().trim().to_string())
    })
}

/// model 会被拼接进请求路径
fn validate_model(settings: &PipelineSettings) -> Result<(), ContractError> {
    let model = &settings.backend.model;
    if model.contains('/') || model.contains(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "backend.model",
            format!("model '{model}' must not contain '/' or whitespace"),
        ));
    }
    Ok(())
}

fn validate_endpoint(settings: &PipelineSettings) -> Result<(), ContractError> {
    let endpoint = &settings.backend.endpoint;
    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        return Err(ContractError::config_validation(
            "backend.endpoint",
            format!("endpoint '{endpoint}' must use http or https"),
        ));
    }
    Ok(())
}

fn validate_api_key_env(settings: &PipelineSettings) -> Result<(), ContractError> {
    let name = &settings.backend.api_key_env;
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ContractError::config_validation(
            "backend.api_key_env",
            format!("'{name}' is not a valid environment variable name"),
        ));
    }
    Ok(())
}
