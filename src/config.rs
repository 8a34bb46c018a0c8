use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,

    /// `development` unlocks unredacted LLM payload logging.
    pub app_env: String,

    // LLM provider
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub llm_timeout_secs: u64,

    /// Operational override: skips the per-user LLM quota entirely.
    pub disable_llm_rate_limit: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a number")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,

            app_env: env::var("APP_ENV").unwrap_or_else(|_| "production".into()),

            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".into()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "gpt-4.1-mini".into()),
            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),

            disable_llm_rate_limit: env::var("DISABLE_LLM_RATE_LIMIT")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

/// Lenient boolean cast: only the usual "off" spellings are false.
pub fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "f" | "false" | "off" | "no"
    )
}
