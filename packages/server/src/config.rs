use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

pub const DEFAULT_USGS_FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Which hosted LLM answers chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProvider {
    Zai,
    Gemini,
}

impl FromStr for ChatProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zai" | "z.ai" | "glm" => Ok(Self::Zai),
            "gemini" => Ok(Self::Gemini),
            other => bail!("unknown chat provider: {}", other),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,

    // Supabase (auth)
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,

    // Ably (real-time fan-out)
    pub ably_api_key: String,

    // Chat assistant
    pub chat_provider: Option<ChatProvider>,
    pub zai_api_key: Option<String>,
    pub zai_base_url: String,
    pub zai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // USGS earthquake polling
    pub usgs_feed_url: String,
    pub usgs_poll_seconds: u64,
    pub usgs_min_magnitude: f64,

    pub nominatim_url: String,
    pub safety_check_minutes: i64,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let zai_api_key = optional("ZAI_API_KEY");
        let gemini_api_key = optional("GEMINI_API_KEY");

        let chat_provider = match optional("CHAT_PROVIDER") {
            Some(p) => Some(p.parse::<ChatProvider>()?),
            None if zai_api_key.is_some() => Some(ChatProvider::Zai),
            None if gemini_api_key.is_some() => Some(ChatProvider::Gemini),
            None => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080)?,
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .context("SUPABASE_JWT_SECRET must be set")?,
            ably_api_key: env::var("ABLY_API_KEY").context("ABLY_API_KEY must be set")?,
            chat_provider,
            zai_api_key,
            zai_base_url: optional("ZAI_BASE_URL")
                .unwrap_or_else(|| llm_client::ZAI_BASE_URL.to_string()),
            zai_model: optional("ZAI_MODEL").unwrap_or_else(|| "glm-4.5".to_string()),
            gemini_api_key,
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            usgs_feed_url: optional("USGS_FEED_URL")
                .unwrap_or_else(|| DEFAULT_USGS_FEED_URL.to_string()),
            usgs_poll_seconds: parse_or("USGS_POLL_SECONDS", 60)?,
            usgs_min_magnitude: parse_or("USGS_MIN_MAGNITUDE", 2.5)?,
            nominatim_url: optional("NOMINATIM_URL")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
            safety_check_minutes: parse_or("SAFETY_CHECK_MINUTES", 30)?,
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be valid: {}", key, e)),
        None => Ok(default),
    }
}

/// Split a comma-separated env value, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
