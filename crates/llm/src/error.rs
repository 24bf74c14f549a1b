//! Provider error classification.
//!
//! Upstream failures are collapsed into a small set of user-facing
//! categories so the client can render a consistent failure UI. The
//! classifier checks structured signals (HTTP status, the provider's
//! JSON error payload) first and falls back to message substrings only
//! when nothing structured is available -- provider wording changes
//! silently break substring matching.

use serde::Deserialize;

/// Errors from the LLM provider layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The API key was rejected by the provider.
    #[error("Invalid or expired API key")]
    InvalidApiKey,

    /// The provider rate-limited the request.
    #[error("Rate limited by the model provider; try again shortly")]
    RateLimited,

    /// The requested model id does not exist (or is not available to
    /// this key).
    #[error("Model not available: {0}")]
    ModelNotFound(String),

    /// The selected model rejected image input.
    #[error("The selected model does not support image input")]
    VisionUnsupported,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Request to model provider failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any other provider-reported failure.
    #[error("Model provider error: {0}")]
    Provider(String),
}

impl LlmError {
    /// Machine-readable code sent to the client in error frames.
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::InvalidApiKey => "INVALID_API_KEY",
            LlmError::RateLimited => "RATE_LIMITED",
            LlmError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            LlmError::VisionUnsupported => "VISION_UNSUPPORTED",
            LlmError::Request(_) => "PROVIDER_UNREACHABLE",
            LlmError::Provider(_) => "LLM_ERROR",
        }
    }
}

/// The provider's JSON error envelope: `{"error": {"code", "status", "message"}}`.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Classify a non-success provider response into an [`LlmError`].
///
/// `model` is the requested model id, used to make not-found errors
/// actionable.
pub fn classify_provider_error(status: u16, body: &str, model: &str) -> LlmError {
    // Structured signals first.
    let detail = serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    let grpc_status = detail.as_ref().and_then(|d| d.status.as_deref());
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| truncate(body, 300));

    match (status, grpc_status) {
        (401 | 403, _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
            LlmError::InvalidApiKey
        }
        (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => LlmError::RateLimited,
        (404, _) | (_, Some("NOT_FOUND")) => LlmError::ModelNotFound(model.to_string()),
        _ => classify_by_message(status, &message, model),
    }
}

/// Last-resort substring classification.
fn classify_by_message(status: u16, message: &str, model: &str) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("api key not valid") || lower.contains("api key expired") {
        LlmError::InvalidApiKey
    } else if lower.contains("quota") || lower.contains("rate limit") {
        LlmError::RateLimited
    } else if lower.contains("is not found") && lower.contains("model") {
        LlmError::ModelNotFound(model.to_string())
    } else if lower.contains("does not support image") || lower.contains("image input") {
        LlmError::VisionUnsupported
    } else {
        LlmError::Provider(format!("HTTP {status}: {message}"))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_codes_classify_before_message_text() {
        assert_matches!(
            classify_provider_error(401, "whatever", "gemini-2.5-flash"),
            LlmError::InvalidApiKey
        );
        assert_matches!(
            classify_provider_error(429, "{}", "gemini-2.5-flash"),
            LlmError::RateLimited
        );
        assert_matches!(
            classify_provider_error(404, "{}", "gemini-9"),
            LlmError::ModelNotFound(m) if m == "gemini-9"
        );
    }

    #[test]
    fn structured_grpc_status_is_honored() {
        let body = r#"{"error": {"code": 400, "status": "UNAUTHENTICATED", "message": "bad key"}}"#;
        assert_matches!(
            classify_provider_error(400, body, "gemini-2.5-flash"),
            LlmError::InvalidApiKey
        );
    }

    #[test]
    fn substring_fallback_catches_key_errors() {
        let body = r#"{"error": {"message": "API key not valid. Please pass a valid API key."}}"#;
        assert_matches!(
            classify_provider_error(400, body, "gemini-2.5-flash"),
            LlmError::InvalidApiKey
        );
    }

    #[test]
    fn vision_rejection_is_classified() {
        let body = r#"{"error": {"message": "This model does not support image input."}}"#;
        assert_matches!(
            classify_provider_error(400, body, "gemini-2.5-flash"),
            LlmError::VisionUnsupported
        );
    }

    #[test]
    fn unknown_errors_keep_the_provider_message() {
        let err = classify_provider_error(500, r#"{"error": {"message": "backend exploded"}}"#, "m");
        assert_matches!(&err, LlmError::Provider(msg) if msg.contains("backend exploded"));
        assert_eq!(err.code(), "LLM_ERROR");
    }
}
