//! Routes
//!
//! Router assembly for the messaging HTTP surface.

pub mod router;
