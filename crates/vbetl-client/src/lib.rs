//! Client for the vendor streaming-platform API.
//!
//! Bearer-token lifecycle, bounded retry, scroll-cursor pagination and
//! per-entity enrichment, plus typed wrappers for the video and
//! scheduled-event endpoints.

pub mod client;
pub mod clock;
pub mod enrich;
pub mod error;
pub mod pagination;
pub mod reporter;
pub mod retry;
pub mod token;
pub mod types;

pub use client::{AuthScheme, ClientSettings, VbrickClient};
pub use clock::{Clock, MockClock, SystemClock};
pub use enrich::{enrich_all, EnrichedEntity, Enrichment, FailedEntity, FailurePolicy};
pub use error::{AuthError, ClientError};
pub use pagination::{scroll, ScrollOutcome, ScrollSpec, Termination};
pub use reporter::{FetchEvent, RecordingReporter, Reporter, TracingReporter};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use token::{Credential, TokenManager, DEFAULT_TTL_SECS};
pub use types::{entities_from_values, Entity, EntityKind};
