//! Configuration for the Subscription API service.

use std::fmt;
use std::time::Duration;

use subagg_db::PoolOptions;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for local runs
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

/// Subscription API configuration
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Connection pool tuning
    pub pool: PoolOptions,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Database
        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections: u32 = parse_or(var("DB_MAX_CONNECTIONS"), 10, "DB_MAX_CONNECTIONS")?;
        let acquire_timeout_secs: u64 =
            parse_or(var("DB_ACQUIRE_TIMEOUT_SECS"), 5, "DB_ACQUIRE_TIMEOUT_SECS")?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid("DB_MAX_CONNECTIONS"));
        }

        let run_migrations = parse_bool(var("RUN_MIGRATIONS"), true, "RUN_MIGRATIONS")?;

        // Server
        let http_port = parse_or(var("HTTP_PORT"), 8080, "HTTP_PORT")?;

        let request_timeout_secs: u64 =
            parse_or(var("REQUEST_TIMEOUT_SECS"), 30, "REQUEST_TIMEOUT_SECS")?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECS"));
        }

        // Observability
        let metrics_enabled = parse_bool(var("METRICS_ENABLED"), true, "METRICS_ENABLED")?;

        let log_format = match var("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => LogFormat::Pretty,
            Some(f) if f == "pretty" => LogFormat::Pretty,
            Some(f) if f == "json" => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            http_port,
            database_url,
            pool: PoolOptions {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            run_migrations,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            log_format,
            log_level,
        })
    }
}

// The database URL usually carries a password
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("pool", &self.pool)
            .field("run_migrations", &self.run_migrations)
            .field("request_timeout", &self.request_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    default: T,
    key: &'static str,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn parse_bool(value: Option<String>, default: bool, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/subagg")]).unwrap();

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
        assert!(config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_database_url_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(matches!(
            load(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/subagg"),
            ("HTTP_PORT", "9000"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("DB_MAX_CONNECTIONS", "32"),
            ("RUN_MIGRATIONS", "false"),
            ("METRICS_ENABLED", "0"),
            ("LOG_FORMAT", "JSON"),
            ("LOG_LEVEL", "subagg_api=debug"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.max_connections, 32);
        assert!(!config.run_migrations);
        assert!(!config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "subagg_api=debug");
    }

    #[test]
    fn test_invalid_values() {
        let base = ("DATABASE_URL", "postgres://db/subagg");
        for (key, value) in [
            ("HTTP_PORT", "http"),
            ("HTTP_PORT", "70000"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("METRICS_ENABLED", "maybe"),
            ("LOG_FORMAT", "xml"),
        ] {
            match load(&[base, (key, value)]) {
                Err(ConfigError::Invalid(k)) => assert_eq!(k, key),
                other => panic!("{key}={value}: expected Invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_debug_hides_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://user:secret@db/subagg")]).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
