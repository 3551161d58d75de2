//! Relay Channel
//!
//! Best-effort, low-latency notification that a message exists. The relay
//! is explicitly not the system of record: delivery is at-most-once with
//! no retry and no durable queue. A recipient that is offline when an
//! event fires recovers the message by refetching its history on the next
//! connect.

pub mod channel;
pub mod subscription;

pub use channel::RelayChannel;
