//! Handler for the streaming chat endpoint.
//!
//! `POST /api/v1/chat` -- validates the request, composes the system
//! instruction, starts the provider stream, and returns a `text/event-stream`
//! response driven by the relay. Validation failures surface as normal
//! JSON error responses; once streaming has begun, all failures travel
//! as terminal SSE frames instead.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use skinny_core::chat::{validate_messages, ChatMessage};
use skinny_core::images::attachment_notes;
use skinny_core::prompt::{compose_system_prompt, ChatMode, PromptInputs};
use skinny_core::skills::referenced_skills;
use skinny_generation::{GenerationDispatch, IdentityHeaders};
use skinny_llm::ChatStreamRequest;

use crate::error::{AppError, AppResult};
use crate::relay::{self, ChatTurn, OutboundFrame};
use crate::state::AppState;

/// Buffer between the relay and the SSE writer.
const FRAME_BUFFER: usize = 64;

/// Request body for `POST /api/v1/chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// User-supplied provider key; the platform key is the fallback.
    #[serde(default)]
    pub api_key: Option<String>,
    /// LLM model override.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Verbatim user-skill context rendered into the system prompt.
    #[serde(default)]
    pub skills_context: Option<String>,
    /// Shortcuts of built-in skills to activate.
    #[serde(default)]
    pub referenced_skills: Vec<String>,
    /// Pre-selected generation model id, or the consultant sentinel.
    #[serde(default)]
    pub selected_generation_model_id: Option<String>,
    /// `"storyboard"` switches on storyboard planning.
    #[serde(default)]
    pub mode: Option<String>,
}

/// POST /api/v1/chat
///
/// Streams the assistant turn as SSE frames and, when the turn carries a
/// generation directive, dispatches it after the stream closes.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Deserialize by hand so shape errors surface as a 400 with a code,
    // not the extractor's default rejection.
    let input: ChatRequest = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    validate_messages(&input.messages).map_err(AppError::Core)?;

    let (api_key, is_platform_key) = match input.api_key.filter(|k| !k.is_empty()) {
        Some(key) => (key, false),
        None => match state.config.platform_api_key.clone() {
            Some(key) => (key, true),
            None => return Err(AppError::MissingApiKey),
        },
    };

    let identity = identity_headers(&headers);
    let whop_user_id = identity
        .user_id
        .clone()
        .unwrap_or_else(|| "anonymous".to_string());

    let mode = ChatMode::from_request(
        input.mode.as_deref(),
        input.selected_generation_model_id.as_deref(),
    );

    let skills = referenced_skills(&state.skills, &input.referenced_skills);
    let notes = attachment_notes(&input.messages);
    let system_instruction = compose_system_prompt(&PromptInputs {
        catalog: &state.catalog,
        skills: &skills,
        skills_context: input.skills_context.as_deref(),
        mode: &mode,
        attachment_notes: &notes,
    });

    let llm_model = input
        .model_id
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| state.config.default_llm_model.clone());

    let turn = ChatTurn {
        llm_model: llm_model.clone(),
        messages: input.messages,
        mode,
        identity,
        whop_user_id,
        is_platform_key,
    };
    let stream_request = ChatStreamRequest {
        model: llm_model,
        api_key,
        system_instruction,
        messages: turn.messages.clone(),
    };

    let llm = Arc::clone(&state.llm);
    let dispatcher: Arc<dyn GenerationDispatch> = state.generation.clone();
    let pool = state.pool.clone();
    let (tx, rx) = mpsc::channel::<OutboundFrame>(FRAME_BUFFER);

    tokio::spawn(async move {
        match llm.stream_generate(stream_request).await {
            Ok(updates) => {
                relay::run_relay(turn, updates, dispatcher, tx, Some(pool)).await;
            }
            Err(e) => {
                // The provider rejected the request before any content
                // streamed; deliver the classification as a terminal frame.
                let _ = tx
                    .send(OutboundFrame::Error {
                        error: e.to_string(),
                        code: e.code().to_string(),
                    })
                    .await;
                let _ = tx.send(OutboundFrame::Done).await;
            }
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame.sse_data())));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Copy the identity headers forwarded verbatim to the generation
/// endpoint. Values that are not valid UTF-8 are dropped.
fn identity_headers(headers: &HeaderMap) -> IdentityHeaders {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    IdentityHeaders {
        authorization: get("authorization"),
        user_id: get("x-whop-user-id"),
        cookie: get("cookie"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn identity_headers_are_copied_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok"));
        headers.insert("x-whop-user-id", HeaderValue::from_static("user_42"));
        headers.insert("cookie", HeaderValue::from_static("session=abc"));

        let identity = identity_headers(&headers);
        assert_eq!(identity.authorization.as_deref(), Some("Bearer tok"));
        assert_eq!(identity.user_id.as_deref(), Some("user_42"));
        assert_eq!(identity.cookie.as_deref(), Some("session=abc"));
    }

    #[test]
    fn absent_identity_headers_stay_none() {
        let identity = identity_headers(&HeaderMap::new());
        assert_eq!(identity, IdentityHeaders::default());
    }

    #[test]
    fn chat_request_accepts_minimal_body() {
        let body = r#"{"messages": [{"role": "user", "content": "draw a cat"}]}"#;
        let request: ChatRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!(request.api_key.is_none());
        assert!(request.referenced_skills.is_empty());
    }
}
