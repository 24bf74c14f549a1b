//! Provider wire shapes.
//!
//! Request and response payloads for the `streamGenerateContent` API.
//! Only the fields this service reads are modeled; everything else in a
//! chunk is ignored by serde.

use serde::{Deserialize, Serialize};

use skinny_core::chat::{ChatMessage, ChatRole};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Top-level request body for `models/{model}:streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
}

/// One role-tagged message in provider format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// `"user"` or `"model"`; absent on the system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

/// A single content part: text or inline image bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData")]
    InlineData(Blob),
}

/// Base64 image bytes with their MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Content {
    /// A system instruction (no role).
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// Map the conversation history to provider contents.
///
/// System messages are skipped (the system instruction travels
/// separately); user attachments with base64 data become inline image
/// parts so vision-capable models can see them.
pub fn build_contents(messages: &[ChatMessage]) -> Vec<Content> {
    let mut contents = Vec::with_capacity(messages.len());
    for message in messages {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
            ChatRole::System => continue,
        };

        let mut parts = Vec::new();
        if !message.content.is_empty() {
            parts.push(Part::Text(message.content.clone()));
        }
        for att in &message.attachments {
            if let (Some(base64), Some(mime_type)) = (&att.base64, &att.mime_type) {
                if !base64.is_empty() {
                    parts.push(Part::InlineData(Blob {
                        mime_type: mime_type.clone(),
                        data: base64.clone(),
                    }));
                }
            }
        }
        if parts.is_empty() {
            continue;
        }

        contents.push(Content {
            role: Some(role.to_string()),
            parts,
        });
    }
    contents
}

// ---------------------------------------------------------------------------
// Streamed response
// ---------------------------------------------------------------------------

/// One decoded SSE chunk of a streaming response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Aggregated token counts, sent on the trailing chunks of a stream.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl StreamChunk {
    /// Concatenate all text parts of the first candidate.
    pub fn text_delta(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut delta = String::new();
        for part in &content.parts {
            if let Part::Text(text) = part {
                delta.push_str(text);
            }
        }
        if delta.is_empty() {
            None
        } else {
            Some(delta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skinny_core::chat::{AttachmentKind, ChatAttachment};

    #[test]
    fn chunk_text_delta_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]}
            }]
        }"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.text_delta().as_deref(), Some("Hello"));
    }

    #[test]
    fn usage_metadata_deserializes() {
        let json = r#"{
            "candidates": [],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34, "totalTokenCount": 46}
        }"#;
        let chunk: StreamChunk = serde_json::from_str(json).unwrap();
        let usage = chunk.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.total_token_count, 46);
    }

    #[test]
    fn build_contents_maps_roles_and_inlines_images() {
        let mut user = ChatMessage::text(ChatRole::User, "look at this");
        user.attachments.push(ChatAttachment {
            kind: AttachmentKind::Image,
            url: None,
            name: None,
            base64: Some("aGVsbG8=".to_string()),
            mime_type: Some("image/png".to_string()),
            purpose: None,
        });
        let messages = vec![
            ChatMessage::text(ChatRole::System, "ignored"),
            user,
            ChatMessage::text(ChatRole::Assistant, "Nice photo."),
        ];

        let contents = build_contents(&messages);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
        assert_eq!(contents[0].parts.len(), 2);
        assert_eq!(contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::system("be brief")),
            contents: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_some());
    }
}
