//! Database operations for messaging
//!
//! Row-level persistence for messages plus the user-reference lookup used
//! to decorate messages with display names. All functions take the pool
//! explicitly; the store decides whether a database is in play.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::shared::{Message, UserRef};

/// Insert a message row
pub async fn insert_message(pool: &PgPool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, sender_id, receiver_id, body, sent_at, is_read)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(message.id)
    .bind(message.sender.id)
    .bind(message.receiver.id)
    .bind(&message.message)
    .bind(message.timestamp)
    .bind(message.read)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load every message, decorated with sender/receiver usernames where the
/// profile rows exist. Used to restore the in-memory snapshot at startup.
pub async fn load_messages(pool: &PgPool) -> Result<Vec<Message>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.sender_id, m.receiver_id, m.body, m.sent_at, m.is_read,
               s.username AS sender_username,
               r.username AS receiver_username
        FROM messages m
        LEFT JOIN users s ON s.id = m.sender_id
        LEFT JOIN users r ON r.id = m.receiver_id
        ORDER BY m.sent_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Message {
            id: row.get("id"),
            sender: UserRef {
                id: row.get("sender_id"),
                username: row.get("sender_username"),
            },
            receiver: UserRef {
                id: row.get("receiver_id"),
                username: row.get("receiver_username"),
            },
            message: row.get("body"),
            timestamp: row.get("sent_at"),
            read: row.get("is_read"),
        })
        .collect())
}

/// Flip `is_read` on all unread messages from `counterpart_id` to
/// `receiver_id`. Returns the number of rows updated; repeated calls are
/// no-ops once applied.
pub async fn mark_messages_read(
    pool: &PgPool,
    receiver_id: Uuid,
    counterpart_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET is_read = TRUE
        WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE
        "#,
    )
    .bind(counterpart_id)
    .bind(receiver_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Look up a user's display name. `None` when there is no such user.
pub async fn get_username(pool: &PgPool, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT username FROM users WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("username")))
}
