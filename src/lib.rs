//! Socialite - Direct Messaging Core
//!
//! Socialite is the direct-messaging subsystem of a social networking
//! application: durable message history, a real-time relay channel that
//! fans new messages out to both participants, and client-side thread
//! reconstruction with unread tracking.
//!
//! # Module Structure
//!
//! The library is organized into three main modules:
//!
//! - **`shared`** - Types serialized between server and client
//!   - `Message` / `UserRef` wire shapes, request/response bodies
//!   - Shared error types
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server exposing the messaging query/mutation surface
//!   - Message store (in-memory snapshot backed by Postgres)
//!   - Per-user relay rooms broadcast over SSE
//!
//! - **`client`** - Headless client library
//!   - HTTP API client and SSE relay consumer
//!   - Thread aggregator: merge, sort, dedup, unread index
//!
//! # Delivery Model
//!
//! The relay channel is notification-only: at-most-once, no retry, no
//! durable queue. The message store is the single source of truth; a
//! client that missed live events recovers by refetching its history.
//!
//! # Thread Safety
//!
//! - **Server**: all state is thread-safe via `Arc<RwLock<>>` and
//!   `broadcast::Sender`
//! - **Client**: the aggregator is single-owner; fetch results and live
//!   events are merged idempotently so arrival order does not matter

/// Types shared between server and client
pub mod shared;

/// Backend server-side code
pub mod backend;

/// Headless client: API access, relay consumption, thread aggregation
pub mod client;
