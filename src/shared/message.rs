/**
 * Message Wire Types
 *
 * This module defines the `Message` struct and its request/response wrappers,
 * shared between the server (storage, relay events) and the client (thread
 * aggregation). Serialization is plain JSON; timestamps travel as RFC3339
 * and deserialize straight into `DateTime<Utc>`, which keeps chronological
 * ordering logic free of string parsing.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a user as it appears on a message.
///
/// Messaging logic only ever reads `id`. The `username` field is display
/// decoration resolved by the profile subsystem when available; it is
/// omitted from the wire when unknown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserRef {
    /// A bare reference carrying only the id.
    pub fn new(id: Uuid) -> Self {
        Self { id, username: None }
    }

    /// A reference decorated with a display name.
    pub fn named(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: Some(username.into()),
        }
    }
}

/// A single direct message between two users.
///
/// Created exactly once, at persistence time, by the server. Immutable
/// except for the `read` flag, which flips to `true` only through the
/// read-receipt path and only for the receiver's inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned message id
    pub id: Uuid,
    /// Sending user
    pub sender: UserRef,
    /// Receiving user; never the same id as `sender`
    pub receiver: UserRef,
    /// Message text content
    pub message: String,
    /// Server-assigned creation time (client-supplied timestamps are never trusted)
    pub timestamp: DateTime<Utc>,
    /// Whether the receiver has opened the thread since this message arrived
    pub read: bool,
}

impl Message {
    pub fn sender_id(&self) -> Uuid {
        self.sender.id
    }

    pub fn receiver_id(&self) -> Uuid {
        self.receiver.id
    }

    /// The other participant relative to `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.sender.id == user_id {
            self.receiver.id
        } else {
            self.sender.id
        }
    }

    /// True when this message counts toward `user_id`'s unread state:
    /// someone else sent it and it has not been read yet.
    pub fn is_unread_for(&self, user_id: Uuid) -> bool {
        self.sender.id != user_id && !self.read
    }
}

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub message: String,
}

/// Body of `GET /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Body of `POST /api/messages/{counterpart_id}/read`
///
/// Read receipts are best-effort: failure is reported as `success: false`
/// rather than an error status, since the local read state is optimistic
/// either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub success: bool,
}
