use std::sync::Arc;

use skinny_core::catalog::ModelSpec;
use skinny_core::skills::Skill;
use skinny_generation::GenerationApi;
use skinny_llm::LlmClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (usage records).
    pub pool: skinny_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Immutable model capability catalog, loaded once at startup.
    pub catalog: Arc<Vec<ModelSpec>>,
    /// Built-in skills, loaded once at startup.
    pub skills: Arc<Vec<Skill>>,
    /// LLM provider client.
    pub llm: Arc<LlmClient>,
    /// Generation dispatch client.
    pub generation: Arc<GenerationApi>,
}
