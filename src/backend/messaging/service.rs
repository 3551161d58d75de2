/**
 * Messaging Service
 *
 * Orchestrates persist-then-relay and exposes the read-receipt operation.
 * The service owns its relay handle explicitly; there is no ambient or
 * global transport object.
 *
 * # Ordering Contract
 *
 * `send_message` returns only after the store has committed. The relay
 * publish happens after the commit and is fire-and-forget: a publish
 * problem never blocks or fails a persistence that already succeeded,
 * because the recipient recovers via a history refetch on reconnect.
 */
use uuid::Uuid;

use crate::backend::auth::CurrentUser;
use crate::backend::error::ApiError;
use crate::backend::messaging::store::MessageStore;
use crate::backend::relay::RelayChannel;
use crate::shared::{Message, UserRef};

/// Server-side messaging orchestration: validate, persist, publish
#[derive(Clone)]
pub struct MessagingService {
    store: MessageStore,
    relay: RelayChannel,
}

impl MessagingService {
    pub fn new(store: MessageStore, relay: RelayChannel) -> Self {
        Self { store, relay }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Persist a message, then publish it to both participants' relay
    /// rooms. The caller gets the persisted message without waiting on
    /// relay delivery.
    pub async fn send_message(
        &self,
        current_user: &CurrentUser,
        receiver: UserRef,
        text: &str,
    ) -> Result<Message, ApiError> {
        let sender = UserRef {
            id: current_user.id,
            username: current_user.username.clone(),
        };

        let message = self.store.persist(sender, receiver, text).await?;

        // Publishing to the sender's own room keeps other sessions of the
        // same user in sync.
        self.relay.publish(&message);

        tracing::info!(
            "[Messaging] message {} sent from {} to {}",
            message.id,
            message.sender.id,
            message.receiver.id
        );

        Ok(message)
    }

    /// Full message history for the current user: every message where they
    /// are sender or receiver.
    pub async fn get_messages(&self, current_user: &CurrentUser) -> Vec<Message> {
        self.store.list_for(current_user.id).await
    }

    /// Mark every unread message from `counterpart_id` to the current user
    /// as read.
    ///
    /// Best-effort: returns `false` rather than an error when the update
    /// cannot be applied. This is UI-state bookkeeping, not a
    /// correctness-critical write.
    pub async fn mark_messages_as_read(
        &self,
        current_user: &CurrentUser,
        counterpart_id: Uuid,
    ) -> bool {
        match self.store.mark_read(current_user.id, counterpart_id).await {
            Ok(flipped) => {
                tracing::debug!(
                    "[Messaging] marked {} messages from {} read for {}",
                    flipped,
                    counterpart_id,
                    current_user.id
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    "[Messaging] read receipt from {} for {} failed: {:?}",
                    current_user.id,
                    counterpart_id,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(id: Uuid) -> CurrentUser {
        CurrentUser { id, username: None }
    }

    #[tokio::test]
    async fn test_send_message_publishes_to_both_rooms() {
        let relay = RelayChannel::new();
        let service = MessagingService::new(MessageStore::in_memory(), relay.clone());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut a_rx = relay.join(a);
        let mut b_rx = relay.join(b);

        let sent = service
            .send_message(&current(a), UserRef::new(b), "hello")
            .await
            .unwrap();

        assert_eq!(a_rx.recv().await.unwrap().id, sent.id);
        assert_eq!(b_rx.recv().await.unwrap().id, sent.id);
    }

    #[tokio::test]
    async fn test_send_persists_before_publish() {
        let relay = RelayChannel::new();
        let service = MessagingService::new(MessageStore::in_memory(), relay.clone());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut b_rx = relay.join(b);

        service
            .send_message(&current(a), UserRef::new(b), "hi")
            .await
            .unwrap();

        // By the time the relay event is observable, the store must
        // already return the row.
        let event = b_rx.recv().await.unwrap();
        let history = service.get_messages(&current(b)).await;
        assert!(history.iter().any(|m| m.id == event.id));
    }

    #[tokio::test]
    async fn test_send_with_no_subscribers_still_succeeds() {
        let service = MessagingService::new(MessageStore::in_memory(), RelayChannel::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Nobody joined either room; delivery is lost by design but the
        // send itself succeeds.
        let sent = service
            .send_message(&current(a), UserRef::new(b), "offline")
            .await
            .unwrap();

        let history = service.get_messages(&current(b)).await;
        assert_eq!(history, vec![sent]);
    }

    #[tokio::test]
    async fn test_self_send_rejected_and_not_persisted() {
        let service = MessagingService::new(MessageStore::in_memory(), RelayChannel::new());
        let a = Uuid::new_v4();

        let err = service
            .send_message(&current(a), UserRef::new(a), "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(service.get_messages(&current(a)).await.is_empty());
    }

    #[tokio::test]
    async fn test_mark_messages_as_read_reports_success() {
        let service = MessagingService::new(MessageStore::in_memory(), RelayChannel::new());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        service
            .send_message(&current(b), UserRef::new(a), "unread")
            .await
            .unwrap();

        assert!(service.mark_messages_as_read(&current(a), b).await);
        // Idempotent repeat still reports success.
        assert!(service.mark_messages_as_read(&current(a), b).await);

        let history = service.get_messages(&current(a)).await;
        assert!(history.iter().all(|m| m.read));
    }
}
