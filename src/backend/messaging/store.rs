/**
 * Message Store
 *
 * Durable, queryable record of every message; the single source of truth
 * for content, ordering, and read state.
 *
 * # Architecture
 *
 * The store keeps a complete in-memory snapshot (`Arc<RwLock<Vec<Message>>>`)
 * backed by an optional Postgres pool. When a pool is configured, every
 * mutation commits to the database before the in-memory snapshot is touched
 * and before the method returns; the snapshot is restored from the database
 * at startup. When no pool is configured (local development, tests), the
 * in-memory snapshot alone is authoritative.
 *
 * # Write Serialization
 *
 * All mutation goes through `persist` / `mark_read`, each scoped to a single
 * user pair, behind the write lock. No partial writes are ever visible.
 */
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::ApiError;
use crate::backend::messaging::db;
use crate::shared::{Message, SharedError, UserRef};

/// Durable record of messages with a complete in-memory snapshot
#[derive(Clone)]
pub struct MessageStore {
    messages: Arc<RwLock<Vec<Message>>>,
    pool: Option<PgPool>,
}

impl MessageStore {
    /// Store backed only by memory; used when no database is configured
    /// and in tests.
    pub fn in_memory() -> Self {
        Self::with_pool(None)
    }

    pub fn with_pool(pool: Option<PgPool>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            pool,
        }
    }

    /// Reload the in-memory snapshot from the database.
    ///
    /// Called once at startup. Returns the number of restored messages;
    /// a missing pool restores nothing.
    pub async fn restore(&self) -> Result<usize, sqlx::Error> {
        let Some(pool) = self.pool.as_ref() else {
            return Ok(0);
        };

        let loaded = db::load_messages(pool).await?;
        let count = loaded.len();
        *self.messages.write().await = loaded;
        Ok(count)
    }

    /// Validate and persist a new message.
    ///
    /// The id and timestamp are assigned here, server-side; a
    /// client-supplied timestamp is never trusted. `read` starts `false`.
    ///
    /// # Errors
    ///
    /// - `Validation` if the text trims to empty or the message is
    ///   self-addressed
    /// - `Database` if the row cannot be committed; the snapshot is left
    ///   untouched in that case
    pub async fn persist(
        &self,
        sender: UserRef,
        receiver: UserRef,
        text: &str,
    ) -> Result<Message, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SharedError::validation("message", "message text cannot be empty").into());
        }
        if receiver.id == sender.id {
            return Err(
                SharedError::validation("receiver_id", "cannot send a message to yourself").into(),
            );
        }

        let message = Message {
            id: Uuid::new_v4(),
            sender,
            receiver,
            message: text.to_string(),
            timestamp: Utc::now(),
            read: false,
        };

        // Commit before the snapshot update and before returning: the relay
        // publish that follows a successful persist must find the row on a
        // subsequent refetch.
        if let Some(pool) = self.pool.as_ref() {
            db::insert_message(pool, &message).await?;
        }

        self.messages.write().await.push(message.clone());

        tracing::debug!(
            "[Store] persisted message {} from {} to {}",
            message.id,
            message.sender.id,
            message.receiver.id
        );

        Ok(message)
    }

    /// Complete snapshot of every message where the user is sender or
    /// receiver. No ordering guarantee; sorting is the aggregator's job.
    pub async fn list_for(&self, user_id: Uuid) -> Vec<Message> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.sender.id == user_id || m.receiver.id == user_id)
            .cloned()
            .collect()
    }

    /// Flip `read` on every unread message from `counterpart_id` to
    /// `receiver_id`. Idempotent; returns the number of rows flipped.
    ///
    /// Messages where `receiver_id` is the sender are never touched.
    pub async fn mark_read(
        &self,
        receiver_id: Uuid,
        counterpart_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        if let Some(pool) = self.pool.as_ref() {
            let flipped = db::mark_messages_read(pool, receiver_id, counterpart_id).await?;
            self.apply_read_locally(receiver_id, counterpart_id).await;
            return Ok(flipped);
        }

        Ok(self.apply_read_locally(receiver_id, counterpart_id).await)
    }

    async fn apply_read_locally(&self, receiver_id: Uuid, counterpart_id: Uuid) -> u64 {
        let mut messages = self.messages.write().await;
        let mut flipped = 0;
        for m in messages.iter_mut() {
            if m.sender.id == counterpart_id && m.receiver.id == receiver_id && !m.read {
                m.read = true;
                flipped += 1;
            }
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRef {
        UserRef::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_persist_assigns_id_and_defaults() {
        let store = MessageStore::in_memory();
        let (a, b) = (user(), user());

        let msg = store.persist(a.clone(), b.clone(), "hello").await.unwrap();

        assert_eq!(msg.sender.id, a.id);
        assert_eq!(msg.receiver.id, b.id);
        assert_eq!(msg.message, "hello");
        assert!(!msg.read);
    }

    #[tokio::test]
    async fn test_persist_rejects_empty_text() {
        let store = MessageStore::in_memory();
        let err = store.persist(user(), user(), "   ").await.unwrap_err();

        match err {
            ApiError::Validation(_) => {}
            other => panic!("Expected Validation error, got {:?}", other),
        }
        // Nothing persisted.
        assert!(store.messages.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_rejects_self_send() {
        let store = MessageStore::in_memory();
        let a = user();

        let err = store.persist(a.clone(), a.clone(), "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(store.messages.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_returns_both_directions() {
        let store = MessageStore::in_memory();
        let (a, b, c) = (user(), user(), user());

        store.persist(a.clone(), b.clone(), "a to b").await.unwrap();
        store.persist(b.clone(), a.clone(), "b to a").await.unwrap();
        store.persist(b.clone(), c.clone(), "b to c").await.unwrap();

        let for_a = store.list_for(a.id).await;
        assert_eq!(for_a.len(), 2);

        let for_c = store.list_for(c.id).await;
        assert_eq!(for_c.len(), 1);
        assert_eq!(for_c[0].message, "b to c");
    }

    #[tokio::test]
    async fn test_mark_read_scoping() {
        let store = MessageStore::in_memory();
        let (a, b) = (user(), user());

        store.persist(b.clone(), a.clone(), "inbound").await.unwrap();
        store.persist(a.clone(), b.clone(), "outbound").await.unwrap();

        let flipped = store.mark_read(a.id, b.id).await.unwrap();
        assert_eq!(flipped, 1);

        let messages = store.list_for(a.id).await;
        let inbound = messages.iter().find(|m| m.sender.id == b.id).unwrap();
        let outbound = messages.iter().find(|m| m.sender.id == a.id).unwrap();

        assert!(inbound.read);
        // A's own outbound message is untouched.
        assert!(!outbound.read);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let store = MessageStore::in_memory();
        let (a, b) = (user(), user());

        store.persist(b.clone(), a.clone(), "one").await.unwrap();
        store.persist(b.clone(), a.clone(), "two").await.unwrap();

        assert_eq!(store.mark_read(a.id, b.id).await.unwrap(), 2);
        // Second call is a no-op.
        assert_eq!(store.mark_read(a.id, b.id).await.unwrap(), 0);
    }
}
