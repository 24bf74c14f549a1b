//! Attachment collection for generation dispatch.
//!
//! Walks the conversation history and picks, for each distinct image
//! purpose, the most recently attached usable image. Recency within a
//! purpose bucket -- not position in the directive turn -- decides which
//! image is sent: a user may attach a reference early in a long
//! conversation and only confirm its role several turns later.
//!
//! Each purpose holds at most one image. Two reference images attached
//! on purpose therefore collapse to the newer one; see DESIGN.md.

use crate::chat::{ChatAttachment, ChatMessage, ChatRole, ImagePurpose};

/// Purpose bucket ordering for deterministic output.
const PURPOSE_ORDER: [ImagePurpose; 4] = [
    ImagePurpose::Reference,
    ImagePurpose::StartingFrame,
    ImagePurpose::EditTarget,
    ImagePurpose::LastFrame,
];

/// An image selected for dispatch, with its resolved purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedImage {
    pub url: Option<String>,
    pub base64: Option<String>,
    pub mime_type: Option<String>,
    pub purpose: ImagePurpose,
}

impl CollectedImage {
    fn from_attachment(att: &ChatAttachment) -> Self {
        Self {
            url: att.url.clone(),
            base64: att.base64.clone(),
            mime_type: att.mime_type.clone(),
            purpose: att.purpose.unwrap_or(ImagePurpose::Reference),
        }
    }
}

/// Collect the images to send with a generation dispatch.
///
/// Scans user messages newest-first; the first usable attachment seen for
/// each purpose wins. Attachments without an explicit purpose default to
/// `reference`. Output order follows the fixed purpose ordering, so the
/// result is independent of scan details.
pub fn collect_generation_images(messages: &[ChatMessage]) -> Vec<CollectedImage> {
    let mut selected: [Option<CollectedImage>; 4] = [None, None, None, None];

    for message in messages.iter().rev() {
        if message.role != ChatRole::User {
            continue;
        }
        for att in &message.attachments {
            if !att.is_usable() {
                continue;
            }
            let image = CollectedImage::from_attachment(att);
            let slot = PURPOSE_ORDER
                .iter()
                .position(|p| *p == image.purpose)
                .expect("purpose is in the fixed ordering");
            if selected[slot].is_none() {
                selected[slot] = Some(image);
            }
        }
    }

    selected.into_iter().flatten().collect()
}

/// Summarize usable attachments as `(name, purpose)` notes for the prompt
/// composer, oldest first.
pub fn attachment_notes(messages: &[ChatMessage]) -> Vec<(String, ImagePurpose)> {
    let mut notes = Vec::new();
    for message in messages.iter().filter(|m| m.role == ChatRole::User) {
        for att in message.attachments.iter().filter(|a| a.is_usable()) {
            let name = att
                .name
                .clone()
                .or_else(|| att.url.clone())
                .unwrap_or_else(|| "uploaded image".to_string());
            notes.push((name, att.purpose.unwrap_or(ImagePurpose::Reference)));
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::AttachmentKind;

    fn attachment(url: &str, purpose: Option<ImagePurpose>) -> ChatAttachment {
        ChatAttachment {
            kind: AttachmentKind::Image,
            url: Some(url.to_string()),
            name: Some(url.to_string()),
            base64: None,
            mime_type: Some("image/png".to_string()),
            purpose,
        }
    }

    fn user_message(attachments: Vec<ChatAttachment>) -> ChatMessage {
        ChatMessage {
            role: ChatRole::User,
            content: String::new(),
            attachments,
        }
    }

    #[test]
    fn most_recent_image_wins_per_purpose() {
        let messages = vec![
            user_message(vec![attachment("a", Some(ImagePurpose::StartingFrame))]),
            ChatMessage::text(ChatRole::Assistant, "Got it."),
            user_message(vec![attachment("b", Some(ImagePurpose::StartingFrame))]),
        ];
        let images = collect_generation_images(&messages);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url.as_deref(), Some("b"));
        assert_eq!(images[0].purpose, ImagePurpose::StartingFrame);
    }

    #[test]
    fn distinct_purposes_each_keep_one_image() {
        let messages = vec![
            user_message(vec![
                attachment("ref", Some(ImagePurpose::Reference)),
                attachment("start", Some(ImagePurpose::StartingFrame)),
            ]),
            user_message(vec![attachment("end", Some(ImagePurpose::LastFrame))]),
        ];
        let images = collect_generation_images(&messages);
        let purposes: Vec<_> = images.iter().map(|i| i.purpose).collect();
        assert_eq!(
            purposes,
            vec![
                ImagePurpose::Reference,
                ImagePurpose::StartingFrame,
                ImagePurpose::LastFrame
            ]
        );
    }

    #[test]
    fn unset_purpose_defaults_to_reference() {
        let messages = vec![user_message(vec![attachment("plain", None)])];
        let images = collect_generation_images(&messages);
        assert_eq!(images[0].purpose, ImagePurpose::Reference);
    }

    #[test]
    fn assistant_attachments_are_ignored() {
        let mut assistant = ChatMessage::text(ChatRole::Assistant, "here");
        assistant
            .attachments
            .push(attachment("from-assistant", Some(ImagePurpose::Reference)));
        let messages = vec![assistant];
        assert!(collect_generation_images(&messages).is_empty());
    }

    #[test]
    fn unusable_attachments_are_skipped() {
        let mut unusable = attachment("", Some(ImagePurpose::Reference));
        unusable.url = Some(String::new());
        let messages = vec![
            user_message(vec![attachment("ok", Some(ImagePurpose::Reference))]),
            user_message(vec![unusable]),
        ];
        let images = collect_generation_images(&messages);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url.as_deref(), Some("ok"));
    }

    #[test]
    fn notes_are_oldest_first_with_defaulted_purpose() {
        let messages = vec![
            user_message(vec![attachment("first.png", None)]),
            user_message(vec![attachment("second.png", Some(ImagePurpose::EditTarget))]),
        ];
        let notes = attachment_notes(&messages);
        assert_eq!(
            notes,
            vec![
                ("first.png".to_string(), ImagePurpose::Reference),
                ("second.png".to_string(), ImagePurpose::EditTarget),
            ]
        );
    }
}
