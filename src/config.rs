use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub media_root: PathBuf,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let media_root = std::env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| "./media".into())
            .into();
        let session_ttl_days = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(14);
        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into());
        cors_origin
            .parse::<axum::http::HeaderValue>()
            .context("CORS_ORIGIN is not a valid header value")?;

        Ok(Self {
            database_url,
            media_root,
            session_ttl_days,
            cookie_secure,
            cors_origin,
        })
    }
}
