use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::SecretsFile;

/// Where each job writes its artifacts.
///
/// Every path falls back to a filename stamped with the run date when the
/// secrets file does not override it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub video_metadata_json: PathBuf,
    pub video_summary_json: PathBuf,
    pub video_analytics_csv: PathBuf,
    pub webcast_metadata_json: PathBuf,
    pub webcast_summary_csv: PathBuf,
    pub failed_webcasts_csv: PathBuf,
    /// Directory the final CSVs are moved into, if any.
    pub publish_dir: Option<PathBuf>,
}

impl OutputPaths {
    #[must_use]
    pub fn resolve(date: NaiveDate, secrets: &SecretsFile) -> Self {
        let stamp = date.format("%Y-%m-%d").to_string();
        let pick = |over: &Option<String>, default: String| {
            over.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map_or_else(|| PathBuf::from(default), PathBuf::from)
        };

        Self {
            video_metadata_json: pick(
                &secrets.metadata_output,
                format!("video_metadata_{stamp}.json"),
            ),
            video_summary_json: pick(
                &secrets.analytics_json,
                format!("video_summary_{stamp}.json"),
            ),
            video_analytics_csv: pick(
                &secrets.analytics_csv,
                format!("video_analytics_{stamp}.csv"),
            ),
            webcast_metadata_json: pick(
                &secrets.webcast_metadata_json,
                format!("webcast_metadata_{stamp}.json"),
            ),
            webcast_summary_csv: pick(
                &secrets.webcast_csv,
                format!("webcast_summary_{stamp}.csv"),
            ),
            failed_webcasts_csv: pick(
                &secrets.failed_webcasts_csv,
                format!("failed_webcasts_{stamp}.csv"),
            ),
            publish_dir: secrets
                .publish_dir
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub proxy: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub auth_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retry_client_errors: bool,
    pub inter_request_delay_ms: u64,
    pub page_size: u32,
    pub max_pages: usize,
    pub attendance_max_pages: usize,
    pub token_refresh_margin_secs: u64,
    pub video_lookback_days: i64,
    pub webcast_lookback_days: i64,
    pub outputs: OutputPaths,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("api_secret", &"[redacted]")
            .field("proxy", &self.proxy.as_ref().map(|_| "[redacted]"))
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("auth_timeout_secs", &self.auth_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("retry_client_errors", &self.retry_client_errors)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("attendance_max_pages", &self.attendance_max_pages)
            .field(
                "token_refresh_margin_secs",
                &self.token_refresh_margin_secs,
            )
            .field("video_lookback_days", &self.video_lookback_days)
            .field("webcast_lookback_days", &self.webcast_lookback_days)
            .field("outputs", &self.outputs)
            .finish()
    }
}
