use log::warn;

const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Runtime configuration, read from the environment at startup
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub allowed_origins: Vec<String>,
    pub openai_api_key: Option<String>,
}

impl Config {
    /// Load config from the environment
    ///
    /// `CORS_ORIGINS` is a comma-separated origin allow-list; when unset it
    /// falls back to the local dev frontend. `OPENAI_API_KEY` may be absent,
    /// in which case chat requests fail with the api-key message instead of
    /// the server refusing to start.
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_else(|_| vec![DEFAULT_ORIGIN.to_string()]);

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set; chat requests will fail until it is configured");
        }

        Config {
            allowed_origins,
            openai_api_key,
        }
    }
}

/// Split a comma-separated origin list, trimming whitespace and dropping
/// empty items
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
