//! 编码图像负载
//!
//! `InlineImage` 是线上格式（媒体类型 + base64 数据），父母照片输入和生成结果共用。
//! `ParentPhoto` 包装一个 `InlineImage` 作为管道输入。

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// 裸 base64 未声明媒体类型时的默认值
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// 带媒体类型的 base64 图像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// 媒体类型，例如 "image/png"
    pub mime_type: String,
    /// base64 数据，不含 data-URL 前缀
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// 解析 `data:<mime>;base64,<payload>` URL
    ///
    /// 不带 `data:` 前缀的字符串视为裸 base64，媒体类型取 [`DEFAULT_MIME_TYPE`]。
    ///
    /// # Errors
    /// 负载为空、缺少逗号分隔符或非 base64 编码时返回 `InvalidPayload`。
    pub fn from_data_url(input: &str) -> Result<Self, ContractError> {
        let input = input.trim();

        let Some(rest) = input.strip_prefix("data:") else {
            return Self::from_base64(DEFAULT_MIME_TYPE, input);
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ContractError::invalid_payload("data URL has no ',' separator"))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ContractError::invalid_payload("data URL is not base64 encoded"))?;

        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Self::from_base64(mime_type, payload)
    }

    /// 包装已编码的 base64 数据
    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self, ContractError> {
        if data.is_empty() {
            return Err(ContractError::invalid_payload("empty image payload"));
        }
        Ok(Self::new(mime_type, data))
    }

    /// 渲染为 `data:` URL，展示层可直接使用
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// 编码后数据长度（字节）
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}

/// 照片对应哪一位父母
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentRole {
    Parent1,
    Parent2,
}

/// 一次运行的父母照片输入
///
/// 运行期间不可变，编排器不做缓存。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentPhoto {
    pub role: ParentRole,
    pub image: InlineImage,
}

impl ParentPhoto {
    pub fn new(role: ParentRole, image: InlineImage) -> Self {
        Self { role, image }
    }

    /// 从 data URL 或裸 base64 字符串构造
    pub fn from_data_url(role: ParentRole, input: &str) -> Result<Self, ContractError> {
        Ok(Self::new(role, InlineImage::from_data_url(input)?))
    }
}
