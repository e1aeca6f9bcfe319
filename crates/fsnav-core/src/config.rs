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
/// Decoupled from the real environment so it can be tested with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let ecom_api_url = require("ECOM_API_URL")?;
    let store_domain = require("PUBLIC_STORE_DOMAIN")?;
    let storefront_api_token = require("PUBLIC_STOREFRONT_API_TOKEN")?;

    let storefront_api_version = or_default("FSNAV_STOREFRONT_API_VERSION", "2024-10");
    let ecom_api_locale = or_default("ECOM_API_LOCALE", "en_GB");
    let handle_proxy_url = lookup("FSNAV_HANDLE_PROXY_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let env = parse_environment(&or_default("FSNAV_ENV", "development"))?;
    let bind_addr = parse_addr("FSNAV_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = parse_log_level(&or_default("FSNAV_LOG_LEVEL", "info"));
    let preview = parse_bool("FSNAV_PREVIEW", "false")?;

    let request_timeout_secs = parse_u64("FSNAV_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FSNAV_USER_AGENT", "fsnav/0.1 (storefront-navigation)");
    let max_retries = parse_u32("FSNAV_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("FSNAV_RETRY_BACKOFF_BASE_MS", "500")?;

    let poll_max_tries = parse_u32("FSNAV_POLL_MAX_TRIES", "5")?;
    if poll_max_tries == 0 {
        return Err(invalid("FSNAV_POLL_MAX_TRIES", "must be at least 1".to_string()));
    }
    let poll_base_delay_ms = parse_u64("FSNAV_POLL_BASE_DELAY_MS", "250")?;

    Ok(AppConfig {
        ecom_api_url,
        ecom_api_locale,
        store_domain,
        storefront_api_token,
        storefront_api_version,
        handle_proxy_url,
        env,
        bind_addr,
        log_level,
        preview,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        poll_max_tries,
        poll_base_delay_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FSNAV_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Maps the numeric log levels used by the CMS frontend API
/// (`DEBUG = 0, INFO = 1, WARNING = 2, ERROR = 3, NONE = 4`) onto tracing
/// filter directives. Anything else is passed through as a filter string.
fn parse_log_level(raw: &str) -> String {
    match raw.trim() {
        "0" => "debug".to_string(),
        "1" => "info".to_string(),
        "2" => "warn".to_string(),
        "3" => "error".to_string(),
        "4" => "off".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
