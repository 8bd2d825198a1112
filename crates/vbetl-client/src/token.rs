//! Bearer credential lifecycle.
//!
//! The vendor issues a token with a lifetime in seconds. [`TokenManager`]
//! caches it and exchanges the API key/secret for a new one once the token
//! is within `margin` of expiring. A refresh replaces the [`Credential`]
//! wholesale; token and issue time never drift apart.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::AuthError;

/// Lifetime assumed when the auth response omits `expiresIn`.
pub const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: Option<String>,
    #[serde(rename = "expiresIn")]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    issued_at: SystemTime,
    ttl: Duration,
}

impl Credential {
    #[must_use]
    pub fn new(token: String, issued_at: SystemTime, ttl: Duration) -> Self {
        Self {
            token,
            issued_at,
            ttl,
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `true` once the credential's age reaches `ttl - margin`.
    ///
    /// A clock that went backwards counts as age zero.
    #[must_use]
    pub fn is_stale(&self, now: SystemTime, margin: Duration) -> bool {
        let age = now.duration_since(self.issued_at).unwrap_or_default();
        age >= self.ttl.saturating_sub(margin)
    }
}

pub struct TokenManager {
    http: Client,
    auth_url: Url,
    api_key: String,
    api_secret: String,
    margin: Duration,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    credential: Mutex<Option<Credential>>,
}

impl TokenManager {
    #[must_use]
    pub fn new(
        http: Client,
        auth_url: Url,
        api_key: &str,
        api_secret: &str,
        margin: Duration,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            auth_url,
            api_key: api_key.to_owned(),
            api_secret: api_secret.to_owned(),
            margin,
            timeout,
            clock,
            credential: Mutex::new(None),
        }
    }

    /// Returns a token that is fresh right now, refreshing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credential exchange fails. Callers treat
    /// this as fatal.
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut slot = self.credential.lock().await;
        let now = self.clock.now();
        if let Some(current) = slot.as_ref() {
            if !current.is_stale(now, self.margin) {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.request_credential().await?;
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    async fn request_credential(&self) -> Result<Credential, AuthError> {
        tracing::info!(url = %self.auth_url, "requesting new access token");

        let payload = json!({
            "apiKey": self.api_key,
            "apiSecret": self.api_secret,
        });
        let response = self
            .http
            .post(self.auth_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "authentication failed");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: AuthResponse = response.json().await.map_err(AuthError::Transport)?;
        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let ttl_secs = body.expires_in.unwrap_or(DEFAULT_TTL_SECS);

        tracing::info!(expires_in = ttl_secs, "obtained access token");
        Ok(Credential::new(
            token,
            self.clock.now(),
            Duration::from_secs(ttl_secs),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)
    }

    #[test]
    fn fresh_credential_is_not_stale() {
        let cred = Credential::new("t".into(), issued(), Duration::from_secs(3600));
        assert!(!cred.is_stale(issued() + Duration::from_secs(10), Duration::from_secs(60)));
    }

    #[test]
    fn credential_turns_stale_exactly_at_ttl_minus_margin() {
        let cred = Credential::new("t".into(), issued(), Duration::from_secs(3600));
        let margin = Duration::from_secs(60);
        assert!(!cred.is_stale(issued() + Duration::from_secs(3539), margin));
        assert!(cred.is_stale(issued() + Duration::from_secs(3540), margin));
    }

    #[test]
    fn margin_larger_than_ttl_is_always_stale() {
        let cred = Credential::new("t".into(), issued(), Duration::from_secs(30));
        assert!(cred.is_stale(issued(), Duration::from_secs(60)));
    }

    #[test]
    fn clock_going_backwards_is_treated_as_fresh() {
        let cred = Credential::new("t".into(), issued(), Duration::from_secs(3600));
        assert!(!cred.is_stale(
            issued() - Duration::from_secs(500),
            Duration::from_secs(60)
        ));
    }
}
