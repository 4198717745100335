//! Application configuration
//!
//! Read once at process startup from the environment (teacher precedent:
//! `PG_POOL_SIZE` read via `std::env::var` in `db/mod.rs`). Not a file-based
//! config system; every field has an explicit env var and a documented
//! default, threaded explicitly through `main.rs` rather than held in a
//! global/static.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub kafka_brokers: String,

    pub http_port: u16,
    pub db_pool_size: u32,
    pub db_statement_timeout_ms: u64,
    pub db_idle_in_tx_ms: u64,

    pub min_transfer_minor: i64,
    pub max_transfer_minor: i64,

    pub fraud_approve_below: i32,
    pub fraud_review_below: i32,
    pub fraud_challenge_below: i32,
    pub fraud_request_timeout_ms: u64,
    pub fraud_fail_open: bool,

    pub lock_ttl_seconds: u64,
    pub idempotency_ttl_seconds: u64,

    pub event_publish_await: bool,
    pub region_utc_offset_minutes: i32,

    pub log_level: String,
    pub log_dir: String,
    pub log_json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

fn env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw.clone())),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(AppConfig {
            database_url,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "127.0.0.1:9092".to_string()),

            http_port: env_or("HTTP_PORT", 8080u16)?,
            db_pool_size: env_or("PG_POOL_SIZE", 10u32)?,
            db_statement_timeout_ms: env_or("DB_STATEMENT_TIMEOUT_MS", 8_000u64)?,
            db_idle_in_tx_ms: env_or("DB_IDLE_IN_TRANSACTION_MS", 5_000u64)?,

            min_transfer_minor: env_or("MIN_TRANSFER_MINOR", 100i64)?,
            max_transfer_minor: env_or("MAX_TRANSFER_MINOR", 10_000_000_00i64)?,

            fraud_approve_below: env_or("FRAUD_APPROVE_BELOW", 30i32)?,
            fraud_review_below: env_or("FRAUD_REVIEW_BELOW", 60i32)?,
            fraud_challenge_below: env_or("FRAUD_CHALLENGE_BELOW", 80i32)?,
            fraud_request_timeout_ms: env_or("FRAUD_REQUEST_TIMEOUT_MS", 5_000u64)?,
            fraud_fail_open: env_or("FRAUD_FAIL_OPEN", true)?,

            lock_ttl_seconds: env_or("LOCK_TTL_SECONDS", 10u64)?,
            idempotency_ttl_seconds: env_or("IDEMPOTENCY_TTL_SECONDS", 86_400u64)?,

            event_publish_await: env_or("EVENT_PUBLISH_AWAIT", false)?,
            region_utc_offset_minutes: env_or("REGION_UTC_OFFSET_MINUTES", 330i32)?,

            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_json: env_or("LOG_JSON", false)?,
        })
    }

    pub fn db_statement_timeout(&self) -> Duration {
        Duration::from_millis(self.db_statement_timeout_ms)
    }

    pub fn db_idle_in_tx_timeout(&self) -> Duration {
        Duration::from_millis(self.db_idle_in_tx_ms)
    }

    pub fn fraud_request_timeout(&self) -> Duration {
        Duration::from_millis(self.fraud_request_timeout_ms)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn fails_without_database_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::remove_var("DATABASE_URL");
        }
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/test");
            env::remove_var("HTTP_PORT");
        }
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.lock_ttl_seconds, 10);
        assert_eq!(config.idempotency_ttl_seconds, 86_400);
    }
}
