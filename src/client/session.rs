/**
 * Chat Session
 *
 * Ties the API client, the relay consumer, and the thread aggregator
 * together into the state a connected client holds. The backfill fetch
 * and the relay subscription are started independently; whichever
 * completes first, the aggregator's idempotent merge produces the same
 * threads.
 */
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::client::api::ApiClient;
use crate::client::error::ClientError;
use crate::client::relay::RelayClient;
use crate::client::threads::ThreadAggregator;
use crate::shared::Message;

/// A connected client's messaging state
pub struct ChatSession {
    api: ApiClient,
    aggregator: ThreadAggregator,
    relay_events: Option<mpsc::UnboundedReceiver<Message>>,
}

impl ChatSession {
    pub fn new(api: ApiClient, current_user: Uuid) -> Self {
        Self {
            api,
            aggregator: ThreadAggregator::new(current_user),
            relay_events: None,
        }
    }

    pub fn aggregator(&self) -> &ThreadAggregator {
        &self.aggregator
    }

    /// Connect to the relay room. Safe to call before or after the first
    /// `refresh`; ordering does not matter.
    pub async fn connect_relay(&mut self) -> Result<(), ClientError> {
        let relay = RelayClient::new(self.api.base_url(), self.api.token());
        self.relay_events = Some(relay.subscribe().await?);
        Ok(())
    }

    /// Backfill: fetch the full history and merge it into the projection.
    /// Also the recovery path after a relay disconnect, since missed
    /// events are never replayed.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let messages = self.api.get_messages().await?;
        self.aggregator.rebuild(messages);
        Ok(())
    }

    /// Apply any queued live events to the projection. Returns the number
    /// applied.
    pub fn drain_relay(&mut self) -> usize {
        let Some(rx) = self.relay_events.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        while let Ok(message) = rx.try_recv() {
            self.aggregator.apply_incoming(message);
            applied += 1;
        }
        applied
    }

    /// Send a message and echo it into the local projection immediately.
    /// The relay copy of the same message arrives later and is dropped as
    /// a duplicate.
    pub async fn send(
        &mut self,
        receiver_id: Uuid,
        text: impl Into<String>,
    ) -> Result<Message, ClientError> {
        let message = self.api.send_message(receiver_id, text).await?;
        self.aggregator.apply_incoming(message.clone());
        Ok(message)
    }

    /// Open a thread: clear unread state locally and fire the server-side
    /// read receipt.
    ///
    /// The receipt is best-effort; a failure is logged and the local
    /// "read" state stays as-is, trading a small consistency risk for UI
    /// responsiveness.
    pub async fn open_thread(&mut self, counterpart_id: Uuid) {
        self.aggregator.open_thread(counterpart_id);

        match self.api.mark_messages_as_read(counterpart_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    "[Session] read receipt for {} not applied server-side",
                    counterpart_id
                );
            }
            Err(e) => {
                tracing::warn!("[Session] read receipt for {} failed: {}", counterpart_id, e);
            }
        }
    }
}
