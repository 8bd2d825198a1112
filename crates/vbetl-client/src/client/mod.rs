//! HTTP client for the vendor streaming-platform REST API.
//!
//! [`VbrickClient`] owns the `reqwest` client, the [`TokenManager`] and the
//! retry policy. Every request goes through [`VbrickClient::get_json`], which
//! attaches a fresh token, classifies the response and runs the bounded retry
//! loop. Endpoint wrappers live in the [`videos`] and [`events`] submodules.

mod events;
mod videos;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use vbetl_core::AppConfig;

use crate::clock::{Clock, SystemClock};
use crate::error::ClientError;
use crate::pagination::{scroll, ScrollOutcome, ScrollSpec};
use crate::reporter::Reporter;
use crate::retry::{fetch_with_retry, RetryPolicy};
use crate::token::TokenManager;

const USER_AGENT: &str = "vbetl/0.1 (analytics-export)";
const AUTH_PATH: [&str; 3] = ["api", "v2", "authenticate"];

/// How the access token is presented in the `Authorization` header.
///
/// Most endpoints take a standard bearer token; the post-event report wants
/// the vendor's own scheme name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    Vbrick,
}

impl AuthScheme {
    fn header_value(self, token: &str) -> String {
        match self {
            Self::Bearer => format!("Bearer {token}"),
            Self::Vbrick => format!("VBrick {token}"),
        }
    }
}

/// Everything [`VbrickClient`] needs, detached from the env/secrets layer.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub proxy: Option<String>,
    pub request_timeout: Duration,
    pub auth_timeout: Duration,
    pub retry: RetryPolicy,
    /// Pause between successive pages and between per-entity detail calls.
    pub inter_request_delay: Duration,
    pub page_size: u32,
    pub max_pages: usize,
    pub attendance_max_pages: usize,
    pub token_refresh_margin: Duration,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            proxy: config.proxy.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            auth_timeout: Duration::from_secs(config.auth_timeout_secs),
            retry: RetryPolicy {
                max_attempts: config.max_retries,
                base_delay: Duration::from_millis(config.retry_delay_ms),
                retry_client_errors: config.retry_client_errors,
            },
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            page_size: config.page_size,
            max_pages: config.max_pages,
            attendance_max_pages: config.attendance_max_pages,
            token_refresh_margin: Duration::from_secs(config.token_refresh_margin_secs),
        }
    }

    /// Defaults for pointing a client at an arbitrary server, e.g. a mock in
    /// tests. Delays are zero so runs are fast.
    #[must_use]
    pub fn for_base_url(base_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            api_key: api_key.to_owned(),
            api_secret: api_secret.to_owned(),
            proxy: None,
            request_timeout: Duration::from_secs(20),
            auth_timeout: Duration::from_secs(30),
            retry: RetryPolicy {
                base_delay: Duration::ZERO,
                ..RetryPolicy::default()
            },
            inter_request_delay: Duration::ZERO,
            page_size: 100,
            max_pages: 200,
            attendance_max_pages: 40,
            token_refresh_margin: Duration::from_secs(60),
        }
    }
}

pub struct VbrickClient {
    http: Client,
    base_url: Url,
    tokens: TokenManager,
    retry: RetryPolicy,
    reporter: Arc<dyn Reporter>,
    inter_request_delay: Duration,
    page_size: u32,
    max_pages: usize,
    attendance_max_pages: usize,
}

impl VbrickClient {
    /// Creates a client using the system clock for token expiry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the base URL cannot be
    /// parsed or cannot carry a path, and [`ClientError::Http`] if the proxy
    /// or the `reqwest::Client` cannot be built.
    pub fn new(settings: ClientSettings, reporter: Arc<dyn Reporter>) -> Result<Self, ClientError> {
        Self::with_clock(settings, reporter, Arc::new(SystemClock))
    }

    /// Creates a client with an injected clock (for token expiry tests).
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_clock(
        settings: ClientSettings,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT);
        if let Some(proxy) = settings.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        let http = builder.build()?;

        let base_url = parse_base_url(&settings.base_url)?;
        let mut auth_url = base_url.clone();
        if let Ok(mut segments) = auth_url.path_segments_mut() {
            segments.pop_if_empty().extend(AUTH_PATH);
        }

        let tokens = TokenManager::new(
            http.clone(),
            auth_url,
            &settings.api_key,
            &settings.api_secret,
            settings.token_refresh_margin,
            settings.auth_timeout,
            clock,
        );

        Ok(Self {
            http,
            base_url,
            tokens,
            retry: settings.retry,
            reporter,
            inter_request_delay: settings.inter_request_delay,
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            attendance_max_pages: settings.attendance_max_pages,
        })
    }

    /// GETs `segments` under the base URL and parses the body as JSON.
    ///
    /// A fresh token is obtained on every attempt. Transport errors, 429 and
    /// 5xx responses are retried under the configured policy; once that is
    /// exhausted the result is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Only fatal errors: [`ClientError::Auth`] when the credential exchange
    /// fails.
    pub async fn get_json(
        &self,
        segments: &[&str],
        params: &[(String, String)],
        scheme: AuthScheme,
    ) -> Result<Option<Value>, ClientError> {
        let url = self.endpoint(segments, params);
        fetch_with_retry(&self.retry, self.reporter.as_ref(), url.as_str(), || {
            self.get_once(&url, scheme)
        })
        .await
    }

    /// Pages through a listing, adding the cursor parameter to `params` on
    /// every request after the first.
    async fn scroll_endpoint(
        &self,
        spec: &ScrollSpec,
        segments: &[&str],
        params: &[(String, String)],
        scheme: AuthScheme,
    ) -> Result<ScrollOutcome, ClientError> {
        scroll(spec, self.reporter.as_ref(), |cursor| {
            let mut page_params = params.to_vec();
            if let Some(cursor) = cursor {
                page_params.push((spec.cursor_param.clone(), cursor));
            }
            async move { self.get_json(segments, &page_params, scheme).await }
        })
        .await
    }

    async fn get_once(&self, url: &Url, scheme: AuthScheme) -> Result<Value, ClientError> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, scheme.header_value(&token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited {
                url: url.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(ClientError::ServerStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::ClientStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Appends `segments` to the base path and `params` as an encoded query.
    fn endpoint(&self, segments: &[&str], params: &[(String, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }
}

/// Normalises to exactly one trailing slash so appended segments land under
/// any path prefix the base URL carries.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", raw.trim().trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
        base_url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl {
            base_url: raw.to_owned(),
            reason: "URL cannot carry a path".to_owned(),
        });
    }
    Ok(url)
}
