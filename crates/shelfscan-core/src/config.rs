use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Aliased settings take the first variable that is set and non-blank. Nothing is required
/// at this stage: the target URL and the credentials are checked by the
/// caller when it actually needs them.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let first_of = |vars: &[&str]| -> Option<String> {
        vars.iter()
            .filter_map(|var| lookup(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        first_of(&[var]).unwrap_or_else(|| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let target_url = first_of(&["SHELFSCAN_URL", "IDEN_URL", "URL"]);
    let username = first_of(&["SHELFSCAN_USERNAME", "IDEN_USERNAME", "IDEN_USER"]);
    let password = first_of(&["SHELFSCAN_PASSWORD", "IDEN_PASSWORD", "PASSWORD"]);
    let data_url = first_of(&["SHELFSCAN_DATA_URL"]);

    let output_path = PathBuf::from(or_default("SHELFSCAN_OUTPUT_PATH", "./product_table.json"));
    let state_path = PathBuf::from(or_default("SHELFSCAN_STATE_PATH", "./session_state.json"));
    let headless = parse_bool("SHELFSCAN_HEADLESS", &or_default("SHELFSCAN_HEADLESS", "true"))?;

    let navigation_timeout_secs = parse_u64("SHELFSCAN_NAVIGATION_TIMEOUT_SECS", "60")?;
    let converge_timeout_secs = parse_u64("SHELFSCAN_CONVERGE_TIMEOUT_SECS", "120")?;
    let settle_pause_ms = parse_u64("SHELFSCAN_SETTLE_PAUSE_MS", "600")?;
    let chrome_header_start = or_default("SHELFSCAN_CHROME_HEADER_START", "Product Inventory");

    Ok(AppConfig {
        target_url,
        username,
        password,
        data_url,
        output_path,
        state_path,
        headless,
        navigation_timeout_secs,
        converge_timeout_secs,
        settle_pause_ms,
        chrome_header_start,
    })
}

/// Parse a boolean flag value.
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true/false, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
