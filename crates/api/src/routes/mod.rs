pub mod chat;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /chat    POST    streaming chat turn (SSE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(chat::router())
}
