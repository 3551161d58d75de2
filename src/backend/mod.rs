//! Backend Server
//!
//! Server-side code: the Axum HTTP server exposing the messaging
//! query/mutation surface, the message store, and the per-user relay
//! rooms that push new messages to connected clients over SSE.

pub mod auth;
pub mod error;
pub mod messaging;
pub mod relay;
pub mod routes;
pub mod server;
