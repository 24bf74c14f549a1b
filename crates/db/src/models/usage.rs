//! Usage record models and DTOs.
//!
//! One row per completed chat turn with non-zero token usage. Rows are
//! best-effort accounting data: inserted fire-and-forget after the SSE
//! stream has closed, never read back by this service.

use serde::Serialize;
use sqlx::FromRow;

use skinny_core::types::{DbId, Timestamp};

/// An immutable usage row from the `usage_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UsageRecord {
    pub id: DbId,
    pub whop_user_id: String,
    /// LLM model id the turn ran on.
    pub model: String,
    pub prompt_tokens: i64,
    pub response_tokens: i64,
    pub total_tokens: i64,
    /// Estimated cost in fractional cents.
    pub estimated_cost_cents: f64,
    /// Whether the platform-shared provider key was used (vs. a
    /// user-supplied key).
    pub is_platform_key: bool,
    pub created_at: Timestamp,
}

/// Input for inserting a new usage row.
#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub whop_user_id: String,
    pub model: String,
    pub prompt_tokens: i64,
    pub response_tokens: i64,
    pub total_tokens: i64,
    pub estimated_cost_cents: f64,
    pub is_platform_key: bool,
}
