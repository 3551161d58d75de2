/**
 * Application State Management
 *
 * `AppState` is the central state container for the Axum application. The
 * `FromRef` implementations let handlers extract exactly the piece of
 * state they need instead of the whole struct, following Axum's
 * recommended pattern.
 *
 * # Thread Safety
 *
 * Everything here is cheap to clone and safe to share: the store wraps
 * its snapshot in `Arc<RwLock<>>`, the relay wraps its rooms in
 * `Arc<Mutex<>>`, and the pool is already a handle.
 */
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::messaging::{MessageStore, MessagingService};
use crate::backend::relay::RelayChannel;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Messaging orchestration (store + relay)
    pub messaging: MessagingService,

    /// Per-user relay rooms; the subscription handler joins these
    pub relay: RelayChannel,

    /// Database connection pool
    ///
    /// `None` when `DATABASE_URL` is not configured; handlers must treat
    /// database-backed decoration as optional in that case.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(store: MessageStore, relay: RelayChannel, db_pool: Option<PgPool>) -> Self {
        Self {
            messaging: MessagingService::new(store, relay.clone()),
            relay,
            db_pool,
        }
    }
}

impl FromRef<AppState> for MessagingService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.messaging.clone()
    }
}

impl FromRef<AppState> for RelayChannel {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.relay.clone()
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
