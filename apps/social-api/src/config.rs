//! Environment-driven configuration.

use std::env;
use std::fmt::Debug;
use std::str::FromStr;

/// Runtime settings for the social API.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite connection URL.
    pub database_url: String,
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 3001),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://social.db".to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 3001,
            database_url: "sqlite://social.db".to_string(),
        }
    }
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr + Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, raw, "Unparseable environment value, using default");
            default
        }),
        Err(_) => default,
    }
}
