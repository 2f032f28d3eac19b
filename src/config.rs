use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key (v3 auth)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// API key for the recommendation generator (OpenAI-compatible)
    pub generator_api_key: String,

    /// Base URL for the recommendation generator
    #[serde(default = "default_generator_api_url")]
    pub generator_api_url: String,

    /// Chat model used for recommendation generation
    #[serde(default = "default_generator_model")]
    pub generator_model: String,

    /// Entitlement backend base URL
    #[serde(default = "default_entitlement_api_url")]
    pub entitlement_api_url: String,

    /// SQLite database URL for the local usage counters
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Free-tier monthly recommendation quota
    #[serde(default = "default_max_free_invocations")]
    pub max_free_invocations: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_generator_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generator_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_entitlement_api_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_database_url() -> String {
    "sqlite://moodreel.db?mode=rwc".to_string()
}

fn default_max_free_invocations() -> u32 {
    3
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
