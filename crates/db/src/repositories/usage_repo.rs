//! Repository for the `usage_records` table.

use sqlx::PgPool;

use crate::models::usage::{NewUsageRecord, UsageRecord};

const USAGE_COLUMNS: &str = "\
    id, whop_user_id, model, prompt_tokens, response_tokens, total_tokens, \
    estimated_cost_cents, is_platform_key, created_at";

/// Append-only access to usage rows.
pub struct UsageRepo;

impl UsageRepo {
    /// Insert one usage row. Returns the stored row.
    pub async fn insert(pool: &PgPool, record: &NewUsageRecord) -> Result<UsageRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO usage_records \
                (whop_user_id, model, prompt_tokens, response_tokens, total_tokens, \
                 estimated_cost_cents, is_platform_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USAGE_COLUMNS}"
        );
        sqlx::query_as::<_, UsageRecord>(&query)
            .bind(&record.whop_user_id)
            .bind(&record.model)
            .bind(record.prompt_tokens)
            .bind(record.response_tokens)
            .bind(record.total_tokens)
            .bind(record.estimated_cost_cents)
            .bind(record.is_platform_key)
            .fetch_one(pool)
            .await
    }
}
