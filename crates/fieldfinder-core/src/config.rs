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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_radius = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("radius must be positive, got {value}")));
        }
        Ok(value)
    };

    let api_base_url = require("FIELDFINDER_API_BASE_URL")?;
    let api_token = lookup("FIELDFINDER_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());

    let env = parse_environment(&or_default("FIELDFINDER_ENV", "development"));
    let log_level = or_default("FIELDFINDER_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("FIELDFINDER_DATA_DIR", "./.fieldfinder"));

    let request_timeout_secs = parse_u64("FIELDFINDER_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("FIELDFINDER_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("FIELDFINDER_RETRY_BACKOFF_BASE_MS", "500")?;
    let bulk_contact_concurrency = parse_usize("FIELDFINDER_BULK_CONTACT_CONCURRENCY", "8")?;
    if bulk_contact_concurrency == 0 {
        return Err(invalid(
            "FIELDFINDER_BULK_CONTACT_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }
    let geolocation_timeout_secs = parse_u64("FIELDFINDER_GEOLOCATION_TIMEOUT_SECS", "10")?;
    let default_radius_km = parse_radius("FIELDFINDER_DEFAULT_RADIUS_KM", "10")?;

    Ok(AppConfig {
        api_base_url,
        api_token,
        env,
        log_level,
        data_dir,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        bulk_contact_concurrency,
        geolocation_timeout_secs,
        default_radius_km,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
