//! Bounded retry around a single request.
//!
//! [`fetch_with_retry`] runs an operation up to `max_attempts` times. The
//! delay between attempts starts at `base_delay` and doubles every time the
//! server answers 429. Once attempts are spent, or the failure is not worth
//! retrying, the result degrades to `Ok(None)`. Fatal errors (auth, bad base
//! URL) are the only ones returned as `Err`.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;
use crate::reporter::{FetchEvent, Reporter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Whether 4xx responses other than 429 go through the retry loop.
    pub retry_client_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            retry_client_errors: true,
        }
    }
}

impl RetryPolicy {
    /// Returns `true` for failures worth another attempt.
    ///
    /// Transport errors, 429 and 5xx always are; other 4xx only when
    /// `retry_client_errors` is set. A body that is not JSON never is.
    #[must_use]
    pub fn is_retriable(&self, err: &ClientError) -> bool {
        match err {
            ClientError::Http(_)
            | ClientError::RateLimited { .. }
            | ClientError::ServerStatus { .. } => true,
            ClientError::ClientStatus { .. } => self.retry_client_errors,
            ClientError::Deserialize { .. }
            | ClientError::Auth(_)
            | ClientError::InvalidBaseUrl { .. } => false,
        }
    }
}

/// Runs `operation` under `policy`, reporting each retry and the final
/// give-up to `reporter`.
///
/// # Errors
///
/// Returns the error only when [`ClientError::is_fatal`] holds.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    reporter: &dyn Reporter,
    target: &str,
    mut operation: F,
) -> Result<Option<T>, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.base_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => return Ok(Some(value)),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => err,
        };

        if !policy.is_retriable(&err) || attempt >= max_attempts {
            reporter.report(&FetchEvent::GaveUp {
                target: target.to_owned(),
                attempts: attempt,
                error: err.to_string(),
            });
            return Ok(None);
        }

        if matches!(err, ClientError::RateLimited { .. }) {
            delay = delay.saturating_mul(2);
        }

        reporter.report(&FetchEvent::Retrying {
            target: target.to_owned(),
            attempt,
            max_attempts,
            delay,
            error: err.to_string(),
        });
        tokio::time::sleep(delay).await;
    }
}
