//! Shared Types
//!
//! Types serialized between the server and the client. Everything in this
//! module is platform-agnostic: plain serde structs plus the shared error
//! type. Timestamps are `chrono::DateTime<Utc>` end to end so chronological
//! comparisons never re-parse strings.

pub mod error;
pub mod message;

pub use error::SharedError;
pub use message::{
    MarkReadResponse, Message, MessagesResponse, SendMessageRequest, UserRef,
};
