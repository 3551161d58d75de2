//! Identity Provider Contract
//!
//! Authentication and session issuance are owned by an external identity
//! subsystem; the messaging core only consumes its output. The contract is
//! narrow: every authenticated request carries a bearer token whose claims
//! yield a stable current-user id. A missing or rejected token is an
//! authentication error, never a silent no-op.

pub mod sessions;

pub use sessions::{extract_current_user, CurrentUser};
