//! Client
//!
//! Headless client library for the messaging core: an HTTP API client, an
//! SSE relay consumer, and the thread aggregator that merges both inputs
//! into ordered, deduplicated, per-counterpart threads with unread state.
//!
//! The backfill fetch and the relay subscription are started independently
//! and may complete in either order; the aggregator's idempotent merge
//! makes the final state identical regardless of the interleaving.

pub mod api;
pub mod error;
pub mod relay;
pub mod session;
pub mod threads;

pub use api::ApiClient;
pub use error::ClientError;
pub use relay::RelayClient;
pub use session::ChatSession;
pub use threads::{Thread, ThreadAggregator};
