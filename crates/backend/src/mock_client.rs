//! Mock 生成后端
//!
//! 用于单元测试的 mock 实现，支持按调用序号注入失败场景，并记录每次调用的时间。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use contracts::{GenerateRequest, GenerateResponse, InlineImage, Part};
use tokio::time::Instant;
use tracing::instrument;

use crate::client::GenerationBackend;
use crate::error::{BackendError, Result};

/// Mock 上报的模型 ID
pub const MOCK_MODEL: &str = "mock-image-model";

/// 单次调用的预设响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// 以给定信息失败
    Fail(String),
    /// 只返回文本 part
    TextOnly,
    /// 只返回图像 part
    ImageOnly,
    /// 不返回任何 candidate
    NoCandidates,
}

/// Mock 后端配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 成功调用返回的文本
    pub text: String,
    /// 每次调用的模拟延迟
    pub latency: Duration,
    /// 按调用序号（从 0 开始）覆盖的响应
    pub overrides: HashMap<usize, MockReply>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            text: "Mock analysis: rounded nose, almond eyes, oval face, wavy dark hair.".into(),
            latency: Duration::ZERO,
            overrides: HashMap::new(),
        }
    }
}

impl MockConfig {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reply(mut self, call: usize, reply: MockReply) -> Self {
        self.overrides.insert(call, reply);
        self
    }

    pub fn fail_call(self, call: usize) -> Self {
        self.reply(call, MockReply::Fail("injected failure".into()))
    }

    /// 所有调用均失败
    pub fn fail_all(mut self, calls: usize) -> Self {
        for call in 0..calls {
            self = self.fail_call(call);
        }
        self
    }
}

/// 一次已记录的后端调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// 调用序号（从 0 开始）
    pub index: usize,
    pub model: String,
    /// 请求中的文本指令
    pub prompt: String,
    /// 发送的内联图像数量
    pub image_parts: usize,
    pub started_at: Instant,
    pub finished_at: Instant,
}

/// Mock 生成后端
pub struct MockBackend {
    /// 配置（可注入失败场景）
    config: MockConfig,
    /// 调用计数器
    next_call: AtomicUsize,
    /// 正在等待响应的请求数
    in_flight: AtomicUsize,
    /// 观察到的最大并发请求数
    max_in_flight: AtomicUsize,
    /// 已完成的调用（按完成顺序）
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    /// 创建默认 mock 后端（所有调用均成功）
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 后端
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_call: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 指定调用序号返回的图像
    pub fn image_for_call(call: usize) -> InlineImage {
        InlineImage::new("image/png", BASE64.encode(format!("mock-image-{call}")))
    }

    /// 已收到的调用次数
    pub fn call_count(&self) -> usize {
        self.next_call.load(Ordering::SeqCst)
    }

    /// 按完成顺序返回已完成的调用
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 同时在途请求数的最大值
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn build_reply(&self, call: usize) -> Result<GenerateResponse> {
        let text = || Part::text(self.config.text.clone());
        let image = || Part::inline(Self::image_for_call(call));

        match self.config.overrides.get(&call) {
            Some(MockReply::Fail(message)) => Err(BackendError::Mock {
                call,
                message: message.clone(),
            }),
            Some(MockReply::TextOnly) => Ok(GenerateResponse::from_parts(vec![text()])),
            Some(MockReply::ImageOnly) => Ok(GenerateResponse::from_parts(vec![image()])),
            Some(MockReply::NoCandidates) => Ok(GenerateResponse::default()),
            None => Ok(GenerateResponse::from_parts(vec![text(), image()])),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationBackend for MockBackend {
    fn model(&self) -> &str {
        MOCK_MODEL
    }

    #[instrument(
        name = "mock_backend_generate",
        skip(self, request),
        fields(model = %request.model, parts = request.contents.parts.len())
    )]
    async fn generate_content(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let index = self.next_call.fetch_add(1, Ordering::SeqCst);
        let started_at = Instant::now();

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.calls.lock().unwrap().push(RecordedCall {
            index,
            model: request.model.clone(),
            prompt: request.prompt().unwrap_or_default().to_string(),
            image_parts: request.image_count(),
            started_at,
            finished_at: Instant::now(),
        });

        self.build_reply(index)
    }
}
