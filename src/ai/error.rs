// src/ai/error.rs

use std::fmt;

use crate::error::AppError;

/// Failures of the generation pipeline, from configuration through
/// the HTTP call to output validation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Credential or endpoint missing/unusable.
    Configuration(String),
    /// Upstream rejected the credential (401).
    Authentication,
    /// Upstream quota exhausted (429).
    RateLimited,
    /// Upstream returned a 5xx.
    UpstreamUnavailable(u16),
    /// Any other non-2xx.
    Upstream { status: u16, message: String },
    /// Request never produced an HTTP response.
    Transport(String),
    /// 2xx without a candidate text.
    EmptyResponse,
    /// Text is not a JSON array.
    MalformedResponse(String),
    /// Array parsed but every element was rejected.
    NoValidQuestions,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Configuration(msg) => write!(f, "AI service is not configured: {}", msg),
            GenerationError::Authentication => write!(f, "Invalid API key for the AI service"),
            GenerationError::RateLimited => {
                write!(f, "AI service quota exceeded, please retry later")
            }
            GenerationError::UpstreamUnavailable(status) => {
                write!(f, "AI service is temporarily unavailable (status {})", status)
            }
            GenerationError::Upstream { status, message } => {
                write!(f, "AI service error {}: {}", status, message)
            }
            GenerationError::Transport(msg) => write!(f, "Failed to reach AI service: {}", msg),
            GenerationError::EmptyResponse => write!(f, "AI service returned no content"),
            GenerationError::MalformedResponse(msg) => {
                write!(f, "Could not parse AI response: {}", msg)
            }
            GenerationError::NoValidQuestions => {
                write!(f, "AI response contained no valid questions")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        let message = err.to_string();
        match err {
            GenerationError::Authentication => AppError::AuthError(message),
            GenerationError::RateLimited => AppError::TooManyRequests(message),
            GenerationError::UpstreamUnavailable(_) => AppError::ServiceUnavailable(message),
            GenerationError::Configuration(_)
            | GenerationError::Upstream { .. }
            | GenerationError::Transport(_)
            | GenerationError::EmptyResponse
            | GenerationError::MalformedResponse(_)
            | GenerationError::NoValidQuestions => AppError::Upstream(message),
        }
    }
}
