//! Application configuration loaded from environment variables.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

/// Password used when no secret file is mounted. Local development only.
pub const INSECURE_FALLBACK_PASSWORD: &str = "password_local_insecure";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Database ===
    /// Path to the file holding the database password.
    #[serde(default = "default_password_file")]
    pub db_password_file: String,

    /// Database host name.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Database port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Database user.
    #[serde(default = "default_db_user")]
    pub db_user: String,

    // === Server Configuration ===
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

/// Where the database password came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    /// Read from the secret file.
    SecretFile,
    /// Secret file absent or unreadable; fallback literal used.
    InsecureFallback,
}

fn default_password_file() -> String {
    "/run/secrets/db_password".to_string()
}

fn default_db_host() -> String {
    "db".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "app_db".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_password_file: default_password_file(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_user: default_db_user(),
            host: default_host(),
            port: default_port(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_host.trim().is_empty() {
            return Err("DB_HOST must not be empty".to_string());
        }

        if self.db_name.trim().is_empty() {
            return Err("DB_NAME must not be empty".to_string());
        }

        if self.db_user.trim().is_empty() {
            return Err("DB_USER must not be empty".to_string());
        }

        if self.db_port == 0 {
            return Err("DB_PORT must be non-zero".to_string());
        }

        Ok(())
    }

    /// Resolve the database password.
    ///
    /// The secret file wins when it exists; its contents are trimmed. Any
    /// failure to read it falls back to [`INSECURE_FALLBACK_PASSWORD`].
    pub fn resolve_password(&self) -> (String, PasswordSource) {
        let path = Path::new(&self.db_password_file);
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => return (contents.trim().to_string(), PasswordSource::SecretFile),
                Err(e) => debug!(path = %path.display(), error = %e, "secret file unreadable"),
            }
        }

        (
            INSECURE_FALLBACK_PASSWORD.to_string(),
            PasswordSource::InsecureFallback,
        )
    }

    /// Filter directive for the log subscriber. `--verbose` wins over
    /// `RUST_LOG`.
    pub fn log_filter(&self, verbose: bool) -> String {
        if verbose {
            "todo_api=debug,tower_http=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// `host:port` the HTTP server listens on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
