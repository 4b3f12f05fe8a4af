use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Secrets that ship in sample `.env` files and must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub admin_token: Option<String>,
    pub api_key: Option<String>,
    pub ai_base_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset and blank values are the
    /// same thing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("BUILDLINK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("BUILDLINK_JWT_SECRET is unset or still a placeholder");
        }

        let host = get("BUILDLINK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("BUILDLINK_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("BUILDLINK_PORT is not a valid port")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            db_path: get("BUILDLINK_DB_PATH")
                .unwrap_or_else(|| "buildlink.db".into())
                .into(),
            addr,
            jwt_secret,
            admin_token: get("BUILDLINK_ADMIN_TOKEN"),
            api_key: get("API_KEY"),
            ai_base_url: get("BUILDLINK_AI_BASE_URL"),
        })
    }
}
