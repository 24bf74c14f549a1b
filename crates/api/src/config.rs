/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`).
    ///
    /// Chat requests stream for the duration of an LLM turn; long
    /// generation jobs are handed off via pending/poll instead of
    /// extending this budget.
    pub request_timeout_secs: u64,
    /// LLM provider base URL.
    pub llm_base_url: String,
    /// Default LLM model when the request does not name one.
    pub default_llm_model: String,
    /// Generation service base URL (the sibling endpoint dispatches go to).
    pub generation_api_url: String,
    /// Platform-shared provider key, used when the request carries none.
    pub platform_api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                                        |
    /// |---------------------------|------------------------------------------------|
    /// | `HOST`                    | `0.0.0.0`                                      |
    /// | `PORT`                    | `3000`                                         |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`                        |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                                          |
    /// | `LLM_BASE_URL`            | `https://generativelanguage.googleapis.com`    |
    /// | `DEFAULT_LLM_MODEL`       | `gemini-2.5-flash`                             |
    /// | `GENERATION_API_URL`      | `http://127.0.0.1:3000/api/v1`                 |
    /// | `PLATFORM_GEMINI_API_KEY` | unset                                          |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into());

        let default_llm_model =
            std::env::var("DEFAULT_LLM_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());

        let generation_api_url = std::env::var("GENERATION_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/v1".into());

        let platform_api_key = std::env::var("PLATFORM_GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            llm_base_url,
            default_llm_model,
            generation_api_url,
            platform_api_key,
        }
    }
}
