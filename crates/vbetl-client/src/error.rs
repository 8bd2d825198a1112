use thiserror::Error;

/// Failure to obtain an access token. Always fatal: a rejected or malformed
/// credential exchange will not fix itself on retry.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("authentication rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("authentication response has no 'token' field")]
    MissingToken,
}

/// Errors produced while talking to the vendor API.
///
/// Only [`ClientError::Auth`] and [`ClientError::InvalidBaseUrl`] escape the
/// resilient fetch layer; everything else degrades to an absent result once
/// retries are spent.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("server error {status} from {url}")]
    ServerStatus { status: u16, url: String },

    #[error("request rejected with {status} by {url}")]
    ClientStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ClientError {
    /// Errors that must stop the run instead of degrading to a missing result.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::InvalidBaseUrl { .. })
    }
}
