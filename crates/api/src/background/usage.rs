//! Fire-and-forget usage recording.

use skinny_db::models::usage::NewUsageRecord;
use skinny_db::repositories::UsageRepo;
use skinny_db::DbPool;

/// Insert one usage row, swallowing any failure.
///
/// Runs detached after the SSE stream has closed; a write error must
/// never alter the response already delivered to the chat client.
pub async fn record_usage(pool: DbPool, record: NewUsageRecord) {
    match UsageRepo::insert(&pool, &record).await {
        Ok(row) => {
            tracing::debug!(
                id = row.id,
                model = %row.model,
                total_tokens = row.total_tokens,
                "Recorded usage"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                model = %record.model,
                whop_user_id = %record.whop_user_id,
                "Failed to record usage; dropping record"
            );
        }
    }
}
