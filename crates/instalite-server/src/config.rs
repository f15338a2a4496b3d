use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use instalite_caption::DEFAULT_MODEL;

/// JWT secrets that only exist in sample configs.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub openai_api_key: Option<String>,
    pub caption_model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port = or("INSTALITE_PORT", "5000")
            .parse()
            .context("INSTALITE_PORT must be a port number")?;

        Ok(Self {
            host: or("INSTALITE_HOST", "0.0.0.0"),
            port,
            db_path: or("INSTALITE_DB_PATH", "instagram-lite.db").into(),
            upload_dir: or("INSTALITE_UPLOAD_DIR", "./uploads").into(),
            jwt_secret: or("INSTALITE_JWT_SECRET", "dev-secret-change-me"),
            openai_api_key: var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            caption_model: or("INSTALITE_CAPTION_MODEL", DEFAULT_MODEL),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
