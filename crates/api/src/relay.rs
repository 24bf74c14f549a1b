//! The streaming relay: one chat turn's orchestration loop.
//!
//! Consumes the LLM provider's update stream and drives the outbound SSE
//! channel. Each content delta is forwarded in arrival order while the
//! full response accumulates in a buffer that is re-scanned for
//! directive fences after every append. Directives are only *acted on*
//! once the provider stream has closed -- the closing fence guarantees
//! the JSON block is syntactically complete. A single mid-stream
//! `planning` frame (boolean latch) gives the UI an early affordance.
//!
//! Frame order on the wire: `content*`, at most one `planning`, then
//! after stream end `generating`/`complete`/`error`, then `[DONE]`.

use std::sync::Arc;

use tokio::sync::mpsc;

use skinny_core::chat::ChatMessage;
use skinny_core::directive::{
    extract_entity_suggestions, extract_generation_directive, extract_shot_list,
    extract_skill_creation, EntitySuggestionDirective, GenerationDirective, ShotListDirective,
    SkillCreationDirective,
};
use skinny_core::images::collect_generation_images;
use skinny_core::pricing::estimate_cost_cents;
use skinny_core::prompt::ChatMode;
use skinny_db::models::usage::NewUsageRecord;
use skinny_db::DbPool;
use skinny_generation::{
    DispatchOutcome, DispatchRequest, GenerationDispatch, GenerationFrame, GenerationStatus,
    IdentityHeaders,
};
use skinny_llm::{StreamUpdate, TokenUsage};

use crate::background;

/// One frame of the chat SSE stream, before serialization.
#[derive(Debug)]
pub enum OutboundFrame {
    /// A text delta: `{"content": ...}`.
    Content(String),
    /// A generation status update: `{"generation": {...}}`.
    Generation(GenerationFrame),
    /// A parsed skill-creation directive: `{"skillCreation": {...}}`.
    SkillCreation(SkillCreationDirective),
    /// A parsed shot list (storyboard mode): `{"shotList": {...}}`.
    ShotList(ShotListDirective),
    /// Parsed entity suggestions (storyboard mode): `{"entitySuggestion": {...}}`.
    EntitySuggestions(EntitySuggestionDirective),
    /// A terminal stream error: `{"error": ..., "code": ...}`.
    Error { error: String, code: String },
    /// The `[DONE]` sentinel; authoritative stream termination.
    Done,
}

impl OutboundFrame {
    /// Serialize to the SSE `data:` payload.
    pub fn sse_data(&self) -> String {
        match self {
            OutboundFrame::Content(delta) => {
                serde_json::json!({ "content": delta }).to_string()
            }
            OutboundFrame::Generation(frame) => {
                serde_json::json!({ "generation": frame }).to_string()
            }
            OutboundFrame::SkillCreation(directive) => {
                serde_json::json!({ "skillCreation": directive }).to_string()
            }
            OutboundFrame::ShotList(directive) => {
                serde_json::json!({ "shotList": directive }).to_string()
            }
            OutboundFrame::EntitySuggestions(directive) => {
                serde_json::json!({ "entitySuggestion": directive }).to_string()
            }
            OutboundFrame::Error { error, code } => {
                serde_json::json!({ "error": error, "code": code }).to_string()
            }
            OutboundFrame::Done => "[DONE]".to_string(),
        }
    }
}

/// Per-request context the relay needs beyond the update stream.
pub struct ChatTurn {
    /// LLM model id the turn runs on (for usage recording).
    pub llm_model: String,
    /// Full conversation history (image collection scans it).
    pub messages: Vec<ChatMessage>,
    pub mode: ChatMode,
    /// Identity headers forwarded to the generation dispatch verbatim.
    pub identity: IdentityHeaders,
    pub whop_user_id: String,
    pub is_platform_key: bool,
}

/// Run the relay until the provider stream terminates.
///
/// Always closes the outbound channel with a `Done` frame. `pool` is
/// `None` in tests; usage recording is skipped without it.
pub async fn run_relay(
    turn: ChatTurn,
    mut updates: mpsc::Receiver<StreamUpdate>,
    dispatcher: Arc<dyn GenerationDispatch>,
    tx: mpsc::Sender<OutboundFrame>,
    pool: Option<DbPool>,
) {
    let mut buffer = String::new();
    let mut planning_sent = false;
    let mut usage: Option<TokenUsage> = None;
    let mut provider_error = None;

    while let Some(update) = updates.recv().await {
        match update {
            StreamUpdate::Content(delta) => {
                buffer.push_str(&delta);
                let _ = tx.send(OutboundFrame::Content(delta)).await;

                // One planning frame per stream, as soon as the first
                // complete generate fence lands in the buffer.
                if !planning_sent && !turn.mode.suppresses_dispatch() {
                    if let Some(directive) = extract_generation_directive(&buffer) {
                        planning_sent = true;
                        let _ = tx
                            .send(OutboundFrame::Generation(GenerationFrame::new(
                                directive.model,
                                GenerationStatus::Planning,
                            )))
                            .await;
                    }
                }
            }
            StreamUpdate::Usage(u) => usage = Some(u),
            StreamUpdate::Error(e) => {
                provider_error = Some(e);
                break;
            }
            StreamUpdate::Done => break,
        }
    }

    if let Some(error) = provider_error {
        tracing::warn!(code = error.code(), error = %error, "Provider stream failed");
        let _ = tx
            .send(OutboundFrame::Error {
                error: error.to_string(),
                code: error.code().to_string(),
            })
            .await;
        let _ = tx.send(OutboundFrame::Done).await;
        return;
    }

    // The stream closed normally; directives in the final buffer are now
    // known to be complete.
    if !turn.mode.suppresses_dispatch() {
        if let Some(directive) = extract_generation_directive(&buffer) {
            dispatch_directive(&turn, directive, dispatcher.as_ref(), &tx).await;
        }
    }

    if let Some(skill) = extract_skill_creation(&buffer) {
        tracing::info!(skill = %skill.name, "Skill creation directive detected");
        let _ = tx.send(OutboundFrame::SkillCreation(skill)).await;
    }

    if turn.mode == ChatMode::Storyboard {
        if let Some(shots) = extract_shot_list(&buffer) {
            let _ = tx.send(OutboundFrame::ShotList(shots)).await;
        }
        if let Some(entities) = extract_entity_suggestions(&buffer) {
            let _ = tx.send(OutboundFrame::EntitySuggestions(entities)).await;
        }
    }

    record_usage_if_any(&turn, usage, pool);

    let _ = tx.send(OutboundFrame::Done).await;
}

/// Dispatch one generation directive and emit its status frames.
///
/// Fires at most once per assistant turn. Never propagates an error to
/// the caller: every failure path collapses into one `error` status
/// frame so the chat turn still completes.
async fn dispatch_directive(
    turn: &ChatTurn,
    directive: GenerationDirective,
    dispatcher: &dyn GenerationDispatch,
    tx: &mpsc::Sender<OutboundFrame>,
) {
    let model = directive.model.clone();
    let prompt = directive.prompt.clone();

    let _ = tx
        .send(OutboundFrame::Generation(GenerationFrame::new(
            model.clone(),
            GenerationStatus::Generating {
                generation_id: None,
            },
        )))
        .await;

    let images = collect_generation_images(&turn.messages);
    let request = DispatchRequest::from_directive(directive, images);

    tracing::info!(
        model = %model,
        images = request.images.len(),
        "Dispatching generation directive"
    );

    let status = match dispatcher.dispatch(&request, &turn.identity).await {
        Ok(DispatchOutcome::Complete {
            image_url,
            output_urls,
        }) => GenerationStatus::Complete {
            image_url,
            output_urls,
            prompt,
        },
        Ok(DispatchOutcome::Pending { generation_id }) => {
            // Polling is the client's job; the chat request's execution
            // window is too short to wait out a generation job.
            GenerationStatus::Generating {
                generation_id: Some(generation_id),
            }
        }
        Ok(DispatchOutcome::Failed {
            error,
            code,
            required,
            available,
        }) => GenerationStatus::Error {
            error,
            code,
            required,
            available,
        },
        Err(e) => {
            tracing::error!(error = %e, "Generation dispatch failed");
            GenerationStatus::Error {
                error: e.to_string(),
                code: None,
                required: None,
                available: None,
            }
        }
    };

    let _ = tx
        .send(OutboundFrame::Generation(GenerationFrame::new(model, status)))
        .await;
}

/// Spawn the fire-and-forget usage write if there is anything to record.
fn record_usage_if_any(turn: &ChatTurn, usage: Option<TokenUsage>, pool: Option<DbPool>) {
    let Some(usage) = usage.filter(|u| !u.is_zero()) else {
        return;
    };
    let Some(pool) = pool else {
        return;
    };

    let record = NewUsageRecord {
        whop_user_id: turn.whop_user_id.clone(),
        model: turn.llm_model.clone(),
        prompt_tokens: usage.prompt_tokens as i64,
        response_tokens: usage.response_tokens as i64,
        total_tokens: usage.total_tokens as i64,
        estimated_cost_cents: estimate_cost_cents(
            &turn.llm_model,
            usage.prompt_tokens,
            usage.response_tokens,
        ),
        is_platform_key: turn.is_platform_key,
    };
    tokio::spawn(background::usage::record_usage(pool, record));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
