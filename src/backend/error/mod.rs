//! Backend Error Module
//!
//! Error types used in HTTP handlers and their conversion to HTTP
//! responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Propagation Policy
//!
//! Authentication and validation failures are hard failures surfaced
//! synchronously to the caller (401 / 400). Relay-path and read-receipt
//! failures are soft: they are logged and never reverse a persistence
//! that already succeeded.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::ApiError;
