//! HTTP generation backend
//!
//! Talks to the `generateContent` endpoint of a Gemini-compatible API.
//! The credential is read from the environment once, at construction.

use std::fmt;

use contracts::{BackendSettings, Content, GenerateRequest, GenerateResponse};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::client::GenerationBackend;
use crate::error::{BackendError, Result};

/// Maximum number of error-body bytes kept in `BackendError::Status`
const MAX_ERROR_BODY: usize = 512;

/// Request body; the backend expects a list of contents
#[derive(Serialize)]
struct RequestBody<'a> {
    contents: [&'a Content; 1],
}

/// Real HTTP backend client
#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Build from settings, reading the credential from `settings.api_key_env`
    ///
    /// # Errors
    /// `MissingCredential` if the variable is unset or blank.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BackendError::MissingCredential {
                var: settings.api_key_env.clone(),
            })?;
        Self::new(settings, api_key)
    }

    /// Build with an explicit credential
    pub fn new(settings: &BackendSettings, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| BackendError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key.into(),
        })
    }

    /// Full URL of the generation endpoint for a model
    pub fn request_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GenerationBackend for GeminiBackend {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(
        name = "gemini_generate",
        skip(self, request),
        fields(model = %request.model, parts = request.contents.parts.len())
    )]
    async fn generate_content(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.request_url(&request.model);
        let body = RequestBody {
            contents: [&request.contents],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::transport(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "backend rejected request");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate(text, MAX_ERROR_BODY),
            });
        }

        debug!(bytes = text.len(), "backend response received");

        serde_json::from_str(&text).map_err(|e| BackendError::decode(e.to_string()))
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{InlineImage, Part};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn settings(endpoint: &str) -> BackendSettings {
        BackendSettings {
            model: "gemini-test".into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            model: "gemini-test".into(),
            contents: Content::from_parts(vec![
                Part::inline(InlineImage::new("image/jpeg", "cGFyZW50MQ==")),
                Part::inline(InlineImage::new("image/jpeg", "cGFyZW50Mg==")),
                Part::text("describe"),
            ]),
        }
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    /// Accept one connection, capture the request, answer with a canned response
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find_header_end(&buf) {
                    let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= pos + 4 + len {
                        break;
                    }
                }
            }

            let reply = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_request_url() {
        let backend = GeminiBackend::new(&settings("https://example.com/"), "k").unwrap();
        assert_eq!(
            backend.request_url("gemini-test"),
            "https://example.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_missing_credential() {
        let mut settings = settings("https://example.com");
        settings.api_key_env = "BABYCAST_TEST_UNSET_KEY_9F3A".into();
        let err = GeminiBackend::from_settings(&settings).unwrap_err();
        assert!(matches!(err, BackendError::MissingCredential { ref var } if var == "BABYCAST_TEST_UNSET_KEY_9F3A"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let backend = GeminiBackend::new(&settings("https://example.com"), "super-secret").unwrap();
        let debug = format!("{backend:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short".into(), 10), "short");
        assert_eq!(truncate("ééé".into(), 3), "é...");
    }

    #[tokio::test]
    async fn test_successful_round_trip() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"b3V0"}}]}}]}"#,
        )
        .await;

        let backend = GeminiBackend::new(&settings(&endpoint), "test-key").unwrap();
        let response = backend.generate_content(&request()).await.unwrap();
        assert_eq!(response.first_inline_image().unwrap().data, "b3V0");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1beta/models/gemini-test:generateContent"));
        assert!(raw.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(raw.contains(r#""contents":[{"parts":[{"inlineData""#));
    }

    #[tokio::test]
    async fn test_rate_limited_status() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .await;

        let backend = GeminiBackend::new(&settings(&endpoint), "test-key").unwrap();
        let err = backend.generate_content(&request()).await.unwrap_err();
        assert!(err.is_rate_limited(), "got: {err}");
        assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (endpoint, _server) = serve_once("HTTP/1.1 200 OK", "not json").await;

        let backend = GeminiBackend::new(&settings(&endpoint), "test-key").unwrap();
        let err = backend.generate_content(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }
}
