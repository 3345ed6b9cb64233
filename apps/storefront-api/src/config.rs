//! Storefront configuration, loaded from environment variables.

use std::time::Duration;

/// Runtime settings.
///
/// Every field has a default suitable for local development:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | `PORT` | 3000 | HTTP listen port |
/// | `DATABASE_URL` | `sqlite://storefront.db` | SQLite database |
/// | `CHECKOUT_TIMEOUT_MS` | 5000 | Cap on one checkout unit of work |
/// | `CHECKOUT_RETRIES` | 3 | Retry budget on catalog contention |
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite database URL.
    pub database_url: String,
    /// Bound on a single checkout unit of work; expiry surfaces as a
    /// retryable `CONTENTION` error.
    pub checkout_timeout: Duration,
    /// How many times the order service re-runs the whole unit of work
    /// after a transient failure.
    pub checkout_retries: u32,
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 3000),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://storefront.db".to_string()),
            checkout_timeout: Duration::from_millis(env_parsed("CHECKOUT_TIMEOUT_MS", 5000)),
            checkout_retries: env_parsed("CHECKOUT_RETRIES", 3),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite://storefront.db".to_string(),
            checkout_timeout: Duration::from_secs(5),
            checkout_retries: 3,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.checkout_timeout, Duration::from_secs(5));
        assert_eq!(settings.checkout_retries, 3);
    }
}
