//! Messaging HTTP Handlers
//!
//! The query/mutation surface consumed by clients:
//!
//! - `GET  /api/messages` - full message history for the caller
//! - `POST /api/messages` - send a message
//! - `POST /api/messages/{counterpart_id}/read` - read receipt
//!
//! Every handler resolves the current user from the bearer token first;
//! an unauthenticated call aborts with 401 before any state change.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::extract_current_user;
use crate::backend::error::ApiError;
use crate::backend::messaging::db;
use crate::backend::messaging::service::MessagingService;
use crate::shared::{
    MarkReadResponse, Message, MessagesResponse, SendMessageRequest, SharedError, UserRef,
};

/// Get the full message history for the current user
pub async fn get_messages(
    State(service): State<MessagingService>,
    headers: HeaderMap,
) -> Result<Json<MessagesResponse>, ApiError> {
    let current_user = extract_current_user(&headers)?;
    let messages = service.get_messages(&current_user).await;

    Ok(Json(MessagesResponse { messages }))
}

/// Send a message to another user
pub async fn send_message(
    State(service): State<MessagingService>,
    State(db_pool): State<Option<PgPool>>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let current_user = extract_current_user(&headers)?;

    let receiver = resolve_receiver(db_pool.as_ref(), request.receiver_id).await?;
    let message = service
        .send_message(&current_user, receiver, &request.message)
        .await?;

    Ok(Json(message))
}

/// Mark all messages from a counterpart as read
pub async fn mark_messages_read(
    State(service): State<MessagingService>,
    Path(counterpart_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let current_user = extract_current_user(&headers)?;
    let success = service
        .mark_messages_as_read(&current_user, counterpart_id)
        .await;

    Ok(Json(MarkReadResponse { success }))
}

/// Resolve the receiver's user reference.
///
/// With a configured database an unknown receiver id is a validation
/// error; a lookup failure only costs the decoration, since messaging
/// logic never depends on any field beyond the id. Without a database the
/// reference is id-only.
async fn resolve_receiver(
    pool: Option<&PgPool>,
    receiver_id: Uuid,
) -> Result<UserRef, ApiError> {
    let Some(pool) = pool else {
        return Ok(UserRef::new(receiver_id));
    };

    match db::get_username(pool, receiver_id).await {
        Ok(Some(username)) => Ok(UserRef::named(receiver_id, username)),
        Ok(None) => {
            Err(SharedError::validation("receiver_id", "no such user").into())
        }
        Err(e) => {
            tracing::warn!(
                "[Messaging] receiver lookup for {} failed, sending undecorated: {:?}",
                receiver_id,
                e
            );
            Ok(UserRef::new(receiver_id))
        }
    }
}
