//! Messaging
//!
//! The server-side messaging core: the durable message store, the
//! orchestration service (persist, then relay), and the HTTP handlers for
//! the query/mutation surface.
//!
//! Ordering is load-bearing here: a message is committed to the store
//! before it is published on the relay, so a client that refetches
//! immediately after a relay event always sees the row.

pub mod db;
pub mod handlers;
pub mod service;
pub mod store;

pub use service::MessagingService;
pub use store::MessageStore;
