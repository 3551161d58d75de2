/**
 * Per-User Relay Rooms
 *
 * One `tokio::sync::broadcast` channel per user id. Every connection a
 * user holds (multiple tabs, multiple devices) joins the same room and
 * receives all events addressed to that user; one user's room never
 * observes another user's events.
 *
 * The handle is constructed once per process and passed by clone into the
 * messaging service and the subscription handler; there is no global
 * transport object.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::shared::Message;

/// Capacity per room; slow consumers see `Lagged` instead of blocking
/// the publisher.
const ROOM_CAPACITY: usize = 256;

/// Per-user broadcast rooms for real-time message notification
#[derive(Clone)]
pub struct RelayChannel {
    rooms: Arc<Mutex<HashMap<Uuid, broadcast::Sender<Message>>>>,
}

impl RelayChannel {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Join the room for `user_id`, creating it on first use.
    ///
    /// Multiple connections may join the same room; each receiver gets
    /// every event published to that user from the moment it joined.
    pub fn join(&self, user_id: Uuid) -> broadcast::Receiver<Message> {
        let mut rooms = self.rooms.lock().unwrap();
        rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Publish a persisted message to both participants' rooms.
    ///
    /// Fire-and-forget: a room with no subscribers simply drops the event.
    /// This method is called only after the store has committed, and it
    /// never fails the send path.
    pub fn publish(&self, message: &Message) {
        self.publish_to(message.sender.id, message);
        self.publish_to(message.receiver.id, message);
    }

    fn publish_to(&self, user_id: Uuid, message: &Message) {
        let sender = self.rooms.lock().unwrap().get(&user_id).cloned();
        match sender {
            Some(tx) => match tx.send(message.clone()) {
                Ok(count) => {
                    tracing::debug!(
                        "[Relay] message {} delivered to {} subscriber(s) of {}",
                        message.id,
                        count,
                        user_id
                    );
                }
                Err(_) => {
                    tracing::debug!("[Relay] no subscribers in room {}, event dropped", user_id);
                }
            },
            None => {
                tracing::debug!("[Relay] no room for {}, event dropped", user_id);
            }
        }
    }

    /// Number of live subscribers in a user's room
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.rooms
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop rooms with no live subscribers
    pub fn cleanup_idle_rooms(&self) {
        self.rooms
            .lock()
            .unwrap()
            .retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::new()
    }
}
