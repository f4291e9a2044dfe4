use anyhow::{Context, Result};
use std::path::PathBuf;

/// Placeholder JWT secrets that must not survive into a real deployment.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Longest auto-delete delay accepted: one day.
pub const MAX_AUTO_DELETE_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub sticker_dir: PathBuf,
    pub static_dir: PathBuf,
    pub auto_delete_secs: i64,
    pub expose_otp: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("SECURECHAT_PORT", "5000");
        let auto_delete = get("SECURECHAT_AUTO_DELETE_SECS", "15");
        let expose_otp = get("SECURECHAT_EXPOSE_OTP", "true");

        let auto_delete_secs: i64 = auto_delete
            .parse()
            .with_context(|| format!("SECURECHAT_AUTO_DELETE_SECS: invalid value '{}'", auto_delete))?;
        if !(1..=MAX_AUTO_DELETE_SECS).contains(&auto_delete_secs) {
            anyhow::bail!(
                "SECURECHAT_AUTO_DELETE_SECS must be between 1 and {}, got {}",
                MAX_AUTO_DELETE_SECS,
                auto_delete_secs
            );
        }

        Ok(Self {
            host: get("SECURECHAT_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("SECURECHAT_PORT: invalid value '{}'", port))?,
            db_path: get("SECURECHAT_DB_PATH", "messaging_app.db").into(),
            jwt_secret: get("SECURECHAT_JWT_SECRET", "dev-secret-change-me"),
            sticker_dir: get("SECURECHAT_STICKER_DIR", "static/images").into(),
            static_dir: get("SECURECHAT_STATIC_DIR", "static").into(),
            auto_delete_secs,
            expose_otp: expose_otp
                .parse()
                .with_context(|| format!("SECURECHAT_EXPOSE_OTP: invalid value '{}'", expose_otp))?,
        })
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
