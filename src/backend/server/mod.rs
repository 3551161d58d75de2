//! Server
//!
//! Application state, configuration loading, and server initialization.

pub mod config;
pub mod init;
pub mod state;

pub use state::AppState;
