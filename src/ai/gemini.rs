// src/ai/gemini.rs

//! Client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{GenerationError, QuestionGenerator};
use crate::config::Config;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<PromptPart<'a>>,
}

#[derive(Debug, Serialize)]
struct PromptPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for one Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            api_base: api_base.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_api_base.clone(),
            Duration::from_secs(config.gemini_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, api_key: &str) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        ))
        .map_err(|e| GenerationError::Configuration(format!("invalid Gemini endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Configuration("GEMINI_API_KEY is not set".to_string()))?;
        let url = self.endpoint(api_key)?;

        let body = GenerateContentRequest {
            contents: vec![Content { parts: vec![PromptPart { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 8192,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting { category, threshold: "BLOCK_MEDIUM_AND_ABOVE" })
                .collect(),
        };

        tracing::info!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors may embed the URL, which carries the key.
                let e = e.without_url();
                tracing::error!("Gemini request failed: {}", e);
                GenerationError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Gemini returned an error: {}", text);
            return Err(classify_status(status, &text));
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerationError::MalformedResponse(format!("unexpected Gemini envelope: {}", e.without_url()))
        })?;

        first_text(envelope).ok_or(GenerationError::EmptyResponse)
    }
}

/// Maps a non-2xx status to the matching error kind.
fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
        s if s.is_server_error() => GenerationError::UpstreamUnavailable(s.as_u16()),
        s => {
            let message = serde_json::from_str::<ErrorEnvelope>(body)
                .ok()
                .and_then(|e| e.error.message)
                .or_else(|| s.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            GenerationError::Upstream { status: s.as_u16(), message }
        }
    }
}

fn first_text(envelope: GenerateContentResponse) -> Option<String> {
    envelope
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED, ""), GenerationError::Authentication);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), GenerationError::RateLimited);
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            GenerationError::UpstreamUnavailable(502)
        );
        assert_eq!(
            classify_status(
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#
            ),
            GenerationError::Upstream { status: 400, message: "API key not valid".to_string() }
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "<html>nope</html>"),
            GenerationError::Upstream { status: 403, message: "Forbidden".to_string() }
        );
    }

    #[test]
    fn test_first_text() {
        let envelope: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[1]"},{"text":"ignored"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(envelope).as_deref(), Some("[1]"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(first_text(empty), None);
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let client = GeminiClient::new(
            Some("k".into()),
            "gemini-2.0-flash",
            "https://example.test/v1beta/",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = client.endpoint("secret").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent?key=secret"
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = GeminiClient::new(None, "m", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.complete("prompt").await,
            Err(GenerationError::Configuration(_))
        ));
    }
}
