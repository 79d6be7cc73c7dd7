//! The analysis boundary: one page image + one credential in, text out.
//!
//! [`AnalysisClient`] is the seam the orchestrator drives. Keeping it a
//! trait object lets tests inject scripted clients and keeps the remote
//! service a black box: the orchestrator never sees HTTP, only a
//! [`ClientError`] whose display string feeds the failure classifier.
//!
//! [`GeminiClient`] is the production implementation. The credential is
//! attached per request rather than baked into the client, so a key supplied
//! after a pause takes effect on the very next call.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::pipeline::encode::PageImage;
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single analysis call.
///
/// The display string is the classification signal: it carries the HTTP
/// status code and whatever detail the service returned, and
/// [`crate::error::FailureKind::classify`] inspects nothing else.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The request never completed (connect failure, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered 200 but the body was not in the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service answered 200 with no text at all.
    #[error("empty response: the model returned no text")]
    EmptyResponse,
}

/// Remote analysis of a single page image.
///
/// Implementations must not retry internally: the orchestrator's pause/resume
/// policy owns the decision of when a failed call is attempted again.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Analyse one page image using `credential`, returning non-empty text.
    async fn analyze(&self, image: &PageImage, credential: &str) -> Result<String, ClientError>;
}

/// Production client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: usize,
    system_prompt: String,
    user_prompt: String,
}

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl GeminiClient {
    /// Build a client from the analysis configuration.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalyzeError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| AnalyzeError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            user_prompt: config
                .user_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string()),
        })
    }

    /// Point the client at a different endpoint (local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(&self, image: &PageImage) -> serde_json::Value {
        json!({
            "system_instruction": { "parts": [{ "text": self.system_prompt }] },
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": image.mime_type, "data": image.base64 } },
                    { "text": self.user_prompt }
                ]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens
            }
        })
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    async fn analyze(&self, image: &PageImage, credential: &str) -> Result<String, ClientError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", credential)
            .json(&self.request_body(image))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!("analysis call failed: HTTP {} — {}", status.as_u16(), detail);
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        match extract_text(&parsed) {
            Some(text) => {
                debug!("analysis call returned {} chars", text.len());
                Ok(text)
            }
            None => Err(ClientError::EmptyResponse),
        }
    }
}

// ── Response parsing ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenate every text part of the first candidate; None when empty.
fn extract_text(resp: &GenerateResponse) -> Option<String> {
    let content = resp.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Pull the service's message and status out of an error body, falling back
/// to a truncated raw body when it is not the documented JSON envelope.
fn error_detail(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if let Some(err) = envelope.error {
            let mut detail = err.message.unwrap_or_default();
            if let Some(status) = err.status {
                if detail.is_empty() {
                    detail = status;
                } else {
                    detail = format!("{} ({})", detail, status);
                }
            }
            if !detail.is_empty() {
                return detail;
            }
        }
    }
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn extract_text_concatenates_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&resp).as_deref(), Some("Hello world"));
    }

    #[test]
    fn blank_parts_count_as_empty() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  \n"}]}}]}"#,
        )
        .unwrap();
        assert!(extract_text(&resp).is_none());
    }

    #[test]
    fn missing_candidates_count_as_empty() {
        let resp: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_text(&resp).is_none());
    }

    #[test]
    fn error_detail_reads_the_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for requests","status":"RESOURCE_EXHAUSTED"}}"#;
        let detail = error_detail(body);
        assert!(detail.contains("Quota exceeded"));
        assert!(detail.contains("RESOURCE_EXHAUSTED"));
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail("plain text error"), "plain text error");
    }

    #[test]
    fn api_error_display_classifies_as_expected() {
        let quota = ClientError::Api {
            status: 429,
            detail: "Quota exceeded (RESOURCE_EXHAUSTED)".into(),
        };
        assert_eq!(
            FailureKind::classify(&quota.to_string()),
            FailureKind::QuotaExceeded
        );

        let auth = ClientError::Api {
            status: 403,
            detail: "API key not valid".into(),
        };
        assert_eq!(
            FailureKind::classify(&auth.to_string()),
            FailureKind::InvalidCredential
        );

        let flake = ClientError::Transport("network timeout".into());
        assert_eq!(FailureKind::classify(&flake.to_string()), FailureKind::Fatal);

        assert_eq!(
            FailureKind::classify(&ClientError::EmptyResponse.to_string()),
            FailureKind::Fatal
        );
    }

    #[test]
    fn request_body_carries_image_and_prompts() {
        let config = AnalysisConfig::default();
        let client = GeminiClient::new(&config).unwrap();
        let image = PageImage {
            base64: "Zm9v".into(),
            mime_type: "image/png",
            width: 1,
            height: 1,
        };
        let body = client.request_body(&image);
        assert_eq!(
            body["contents"][0]["parts"][0]["inline_data"]["data"],
            "Zm9v"
        );
        assert!(body["system_instruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("document analyst"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
    }
}
