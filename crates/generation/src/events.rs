//! Generation status events streamed to chat clients.
//!
//! These represent the lifecycle the UI renders while a directive is
//! being acted on: `planning -> generating -> (complete | error)`. They
//! are scoped to one chat request's SSE channel; there is no
//! cross-request fan-out.

use serde::Serialize;

/// Lifecycle state of one generation dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationStatus {
    /// A complete generate directive was detected mid-stream; the UI can
    /// show an affordance. Best-effort, at most once per stream.
    Planning,

    /// Dispatch is in flight, or the downstream job was accepted and is
    /// still running. `generation_id` is present in the latter case and
    /// is the client's polling handle.
    Generating {
        #[serde(rename = "generationId", skip_serializing_if = "Option::is_none")]
        generation_id: Option<String>,
    },

    /// The downstream call returned a finished result.
    Complete {
        #[serde(rename = "imageUrl")]
        image_url: String,
        /// Always contains `image_url`; multi-output models add more.
        #[serde(rename = "outputUrls")]
        output_urls: Vec<String>,
        /// The prompt that was dispatched, echoed for the UI.
        prompt: String,
    },

    /// The dispatch failed; the chat turn itself still completes.
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        /// Balance required, for insufficient-balance errors.
        #[serde(skip_serializing_if = "Option::is_none")]
        required: Option<f64>,
        /// Balance available, for insufficient-balance errors.
        #[serde(skip_serializing_if = "Option::is_none")]
        available: Option<f64>,
    },
}

/// The `{generation: ...}` SSE payload: a status plus the model it
/// concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationFrame {
    #[serde(flatten)]
    pub status: GenerationStatus,
    pub model: String,
}

impl GenerationFrame {
    pub fn new(model: impl Into<String>, status: GenerationStatus) -> Self {
        Self {
            status,
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generating_frame_serializes_with_id() {
        let frame = GenerationFrame::new(
            "flux-2-pro",
            GenerationStatus::Generating {
                generation_id: Some("g1".to_string()),
            },
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["status"], "generating");
        assert_eq!(json["generationId"], "g1");
        assert_eq!(json["model"], "flux-2-pro");
    }

    #[test]
    fn generating_frame_omits_absent_id() {
        let frame = GenerationFrame::new(
            "flux-2-pro",
            GenerationStatus::Generating {
                generation_id: None,
            },
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert!(json.get("generationId").is_none());
    }

    #[test]
    fn complete_frame_carries_urls_and_prompt() {
        let frame = GenerationFrame::new(
            "seedream-4",
            GenerationStatus::Complete {
                image_url: "https://cdn/img.png".to_string(),
                output_urls: vec!["https://cdn/img.png".to_string()],
                prompt: "a cat".to_string(),
            },
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["imageUrl"], "https://cdn/img.png");
        assert_eq!(json["outputUrls"][0], "https://cdn/img.png");
        assert_eq!(json["prompt"], "a cat");
    }

    #[test]
    fn error_frame_includes_balance_fields_when_present() {
        let frame = GenerationFrame::new(
            "kling-v2-5",
            GenerationStatus::Error {
                error: "Insufficient balance".to_string(),
                code: Some("INSUFFICIENT_BALANCE".to_string()),
                required: Some(42.0),
                available: Some(7.5),
            },
        );
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["required"], 42.0);
        assert_eq!(json["available"], 7.5);
    }
}
