use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds a value that does not parse.
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
/// Returns `ConfigError` if an env var holds a value that does not parse.
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
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    // Optional: maintenance commands work without it, and the pipeline
    // checks for it explicitly before starting.
    let classifier_api_key = lookup("OPENAI_API_KEY").ok();

    let database_path = PathBuf::from(or_default(
        "SITECAT_DB_PATH",
        "./classification_results.db",
    ));
    let log_level = or_default("SITECAT_LOG_LEVEL", "info");

    let classifier_base_url = or_default("SITECAT_CLASSIFIER_BASE_URL", "https://api.openai.com");
    let classifier_model = or_default("SITECAT_CLASSIFIER_MODEL", "gpt-4.1-nano");
    let classifier_max_attempts = parse_u32("SITECAT_CLASSIFIER_MAX_ATTEMPTS", "2")?;
    let classifier_backoff_base_ms = parse_u64("SITECAT_CLASSIFIER_BACKOFF_BASE_MS", "2000")?;

    let fetch_timeout_secs = parse_u64("SITECAT_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_user_agent = or_default("SITECAT_FETCH_USER_AGENT", "sitecat/0.1 (site-classifier)");

    let default_workers = parse_usize("SITECAT_WORKERS", "4")?;
    if default_workers == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SITECAT_WORKERS".to_string(),
            reason: "worker count must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_path,
        log_level,
        classifier_api_key,
        classifier_base_url,
        classifier_model,
        classifier_max_attempts,
        classifier_backoff_base_ms,
        fetch_timeout_secs,
        fetch_user_agent,
        default_workers,
    })
}
