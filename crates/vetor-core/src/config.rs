use crate::app_config::{AppConfig, AuthMode, BatchMode, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a present env var holds an invalid value.
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
/// Returns `ConfigError` if a present env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
///
/// Marketplace credentials are deliberately optional: their absence degrades the
/// service to catalog fallback data instead of failing startup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

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

    let env = parse_environment(&or_default("VETOR_ENV", "development"));

    let bind_addr = parse_addr("VETOR_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VETOR_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("VETOR_CATALOG_PATH", "./config/products.yaml"));

    let meli_app_id = lookup("MELI_APP_ID").ok();
    let meli_app_secret = lookup("MELI_APP_SECRET").ok();
    let meli_refresh_token = lookup("MELI_REFRESH_TOKEN").ok();
    let meli_affiliate_id = lookup("MELI_AFFILIATE_ID").ok();
    let webhook_secret = lookup("VETOR_WEBHOOK_SECRET").ok();

    let batch_mode = parse_batch_mode(&or_default("VETOR_BATCH_MODE", "per-item"))?;
    let auth_mode = parse_auth_mode(&or_default("VETOR_AUTH_MODE", "none"))?;

    let http_timeout_secs = parse_u64("VETOR_HTTP_TIMEOUT_SECS", "5")?;
    let fetch_concurrency = parse_usize("VETOR_FETCH_CONCURRENCY", "8")?;
    let cache_ttl_secs = parse_u64("VETOR_CACHE_TTL_SECS", "3600")?;
    let token_safety_margin_secs = parse_u64("VETOR_TOKEN_SAFETY_MARGIN_SECS", "120")?;
    let max_retries = parse_u32("VETOR_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("VETOR_RETRY_BACKOFF_BASE_MS", "500")?;
    let rate_limit_per_min = parse_usize("VETOR_RATE_LIMIT_PER_MIN", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        meli_app_id,
        meli_app_secret,
        meli_refresh_token,
        meli_affiliate_id,
        webhook_secret,
        batch_mode,
        auth_mode,
        http_timeout_secs,
        fetch_concurrency,
        cache_ttl_secs,
        token_safety_margin_secs,
        max_retries,
        retry_backoff_base_ms,
        rate_limit_per_min,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_batch_mode(raw: &str) -> Result<BatchMode, ConfigError> {
    match raw {
        "single-call" => Ok(BatchMode::SingleCall),
        "per-item" => Ok(BatchMode::PerItem),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VETOR_BATCH_MODE".to_string(),
            reason: format!("expected 'single-call' or 'per-item', got '{other}'"),
        }),
    }
}

fn parse_auth_mode(raw: &str) -> Result<AuthMode, ConfigError> {
    match raw {
        "none" => Ok(AuthMode::None),
        "client-credentials" => Ok(AuthMode::ClientCredentials),
        "refresh-token" => Ok(AuthMode::RefreshToken),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VETOR_AUTH_MODE".to_string(),
            reason: format!(
                "expected 'none', 'client-credentials' or 'refresh-token', got '{other}'"
            ),
        }),
    }
}
