use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ADRELAY_ENV", "development"))?;

    let bind_addr = parse_addr("ADRELAY_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ADRELAY_LOG_LEVEL", "info");

    let embedding_api_key = lookup("ADRELAY_EMBEDDING_API_KEY").ok();
    let embedding_base_url = or_default("ADRELAY_EMBEDDING_BASE_URL", "https://api.openai.com/v1");
    let embedding_model = or_default("ADRELAY_EMBEDDING_MODEL", "text-embedding-3-small");
    let embedding_dimension = parse_usize("ADRELAY_EMBEDDING_DIMENSION", "1536")?;
    let embedding_timeout_secs = parse_u64("ADRELAY_EMBEDDING_TIMEOUT_SECS", "30")?;
    let embedding_max_retries = parse_u32("ADRELAY_EMBEDDING_MAX_RETRIES", "3")?;
    let embedding_retry_backoff_base_ms =
        parse_u64("ADRELAY_EMBEDDING_RETRY_BACKOFF_BASE_MS", "1000")?;

    let db_max_connections = parse_u32("ADRELAY_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ADRELAY_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ADRELAY_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        embedding_api_key,
        embedding_base_url,
        embedding_model,
        embedding_dimension,
        embedding_timeout_secs,
        embedding_max_retries,
        embedding_retry_backoff_base_ms,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse the deployment environment name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(raw: &str) -> Result<Environment, ConfigError> {
    match raw {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ADRELAY_ENV".to_string(),
            reason: format!("unknown environment: {other}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
