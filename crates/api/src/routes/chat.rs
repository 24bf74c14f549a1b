//! Route definitions for the streaming chat endpoint.
//!
//! ```text
//! POST   /chat    chat (SSE response)
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes merged into the `/api/v1` nest.
pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat::chat))
}
