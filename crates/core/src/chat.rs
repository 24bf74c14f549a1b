//! Chat message and attachment types.
//!
//! These are the wire shapes the web client POSTs to the chat endpoint.
//! They are ephemeral -- constructed per request, never persisted here.
//! Field names follow the client's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// How an attachment was added to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// An image uploaded directly into the chat.
    Image,
    /// An image referenced from the user's library.
    Reference,
}

/// The user-assigned role of an attached image.
///
/// The purpose determines which generation parameter the image binds to
/// downstream (reference set, start frame, edit target, end frame) and
/// must be threaded through to the generation call unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePurpose {
    Reference,
    StartingFrame,
    EditTarget,
    LastFrame,
}

impl ImagePurpose {
    /// Wire name of the purpose, as sent to the generation endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImagePurpose::Reference => "reference",
            ImagePurpose::StartingFrame => "starting_frame",
            ImagePurpose::EditTarget => "edit_target",
            ImagePurpose::LastFrame => "last_frame",
        }
    }

    /// Human-readable label used in prompt annotations.
    pub fn label(&self) -> &'static str {
        match self {
            ImagePurpose::Reference => "reference image",
            ImagePurpose::StartingFrame => "starting frame",
            ImagePurpose::EditTarget => "image to edit",
            ImagePurpose::LastFrame => "last frame",
        }
    }
}

/// An image attached to a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAttachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Base64-encoded image bytes, present for direct uploads.
    #[serde(default)]
    pub base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Unset means the client left the role to its default (`reference`).
    #[serde(default)]
    pub purpose: Option<ImagePurpose>,
}

impl ChatAttachment {
    /// Whether the attachment carries enough data to be sent downstream.
    pub fn is_usable(&self) -> bool {
        let has_url = self.url.as_deref().is_some_and(|u| !u.is_empty());
        let has_base64 = self.base64.as_deref().is_some_and(|b| !b.is_empty());
        has_url || has_base64
    }
}

/// One turn of the conversation, as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<ChatAttachment>,
}

impl ChatMessage {
    /// Convenience constructor for a text-only message.
    pub fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// Validate an inbound conversation before any provider work starts.
pub fn validate_messages(messages: &[ChatMessage]) -> Result<(), CoreError> {
    if messages.is_empty() {
        return Err(CoreError::Validation(
            "messages must not be empty".to_string(),
        ));
    }
    Ok(())
}
