use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::app_config::{AppConfig, OutputPaths};
use crate::ConfigError;

const DEFAULT_SECRETS_PATH: &str = "secrets.json";

/// Contents of the JSON secrets file.
///
/// Every field is optional at the parse layer so that a missing required key
/// surfaces as [`ConfigError::MissingField`] naming the key, not as an opaque
/// serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsFile {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Proxy URL applied to every request, including authentication.
    pub proxies: Option<String>,
    pub metadata_output: Option<String>,
    pub analytics_json: Option<String>,
    pub analytics_csv: Option<String>,
    pub webcast_metadata_json: Option<String>,
    pub webcast_csv: Option<String>,
    pub failed_webcasts_csv: Option<String>,
    pub publish_dir: Option<String>,
}

/// Load application configuration from `.env`, the process environment and
/// the secrets file named by `VBETL_CONFIG_JSON` (default `secrets.json`).
///
/// # Errors
///
/// Returns `ConfigError` if the secrets file is missing or malformed, a
/// required field is absent, or an env tunable fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let secrets_path = std::env::var("VBETL_CONFIG_JSON")
        .unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
    let secrets = load_secrets(Path::new(&secrets_path))?;
    let today = chrono::Local::now().date_naive();
    build_app_config(|key| std::env::var(key), &secrets, today)
}

/// Read and parse the JSON secrets file.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] if the file cannot be read and
/// [`ConfigError::SecretsFileParse`] if it is not valid JSON.
pub fn load_secrets(path: &Path) -> Result<SecretsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::SecretsFileParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Build application configuration from a secrets file and an env-var lookup.
///
/// The lookup is injected so parsing can be tested against a plain `HashMap`
/// without touching the process environment.
fn build_app_config<F>(
    lookup: F,
    secrets: &SecretsFile,
    today: NaiveDate,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |field: &str, value: &Option<String>| -> Result<String, ConfigError> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingField(field.to_string()))
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

    let parse_page_cap = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let pages = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if pages == 0 {
            return Err(invalid(var, "at least one page is required".to_string()));
        }
        Ok(pages)
    };

    let parse_days = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let days = or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if days < 0 {
            return Err(invalid(var, "must not be negative".to_string()));
        }
        Ok(days)
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let base_url = require("base_url", &secrets.base_url)?;
    let api_key = require("api_key", &secrets.api_key)?;
    let api_secret = require("api_secret", &secrets.api_secret)?;
    let proxy = secrets
        .proxies
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let log_level = or_default("VBETL_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("VBETL_REQUEST_TIMEOUT_SECS", "20")?;
    let auth_timeout_secs = parse_u64("VBETL_AUTH_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("VBETL_MAX_RETRIES", "3")?;
    if max_retries == 0 {
        return Err(invalid(
            "VBETL_MAX_RETRIES",
            "at least one attempt is required".to_string(),
        ));
    }
    let retry_delay_ms = parse_u64("VBETL_RETRY_DELAY_MS", "2000")?;
    let retry_client_errors = parse_bool("VBETL_RETRY_CLIENT_ERRORS", "true")?;
    let inter_request_delay_ms = parse_u64("VBETL_INTER_REQUEST_DELAY_MS", "100")?;
    let page_size = parse_u32("VBETL_PAGE_SIZE", "100")?;
    let max_pages = parse_page_cap("VBETL_MAX_PAGES", "200")?;
    let attendance_max_pages = parse_page_cap("VBETL_ATTENDANCE_MAX_PAGES", "40")?;
    let token_refresh_margin_secs = parse_u64("VBETL_TOKEN_REFRESH_MARGIN_SECS", "60")?;
    let video_lookback_days = parse_days("VBETL_VIDEO_LOOKBACK_DAYS", "730")?;
    let webcast_lookback_days = parse_days("VBETL_WEBCAST_LOOKBACK_DAYS", "180")?;

    Ok(AppConfig {
        base_url,
        api_key,
        api_secret,
        proxy,
        log_level,
        request_timeout_secs,
        auth_timeout_secs,
        max_retries,
        retry_delay_ms,
        retry_client_errors,
        inter_request_delay_ms,
        page_size,
        max_pages,
        attendance_max_pages,
        token_refresh_margin_secs,
        video_lookback_days,
        webcast_lookback_days,
        outputs: OutputPaths::resolve(today, secrets),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
