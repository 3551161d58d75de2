/**
 * Server Initialization
 *
 * Builds the Axum application: state creation, optional database loading,
 * snapshot restoration, route configuration, and the periodic relay-room
 * cleanup task.
 *
 * # Initialization Process
 *
 * 1. Load the optional database pool (migrations run here)
 * 2. Create the message store and restore its snapshot from the database
 * 3. Create the relay channel
 * 4. Assemble `AppState` and the router
 * 5. Spawn the idle-room cleanup task
 *
 * Restoration failures are logged but don't prevent startup; the server
 * then begins with an empty history.
 */
use axum::Router;

use crate::backend::messaging::MessageStore;
use crate::backend::relay::RelayChannel;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing messaging server");

    let db_pool = load_database().await;

    let store = MessageStore::with_pool(db_pool.clone());
    match store.restore().await {
        Ok(0) => tracing::info!("Starting with empty message history"),
        Ok(count) => tracing::info!("Restored {} messages from database", count),
        Err(e) => {
            tracing::warn!("Failed to restore messages, starting empty: {:?}", e);
        }
    }

    let relay = RelayChannel::new();
    let app_state = AppState::new(store, relay.clone(), db_pool);
    let app = create_router(app_state);

    // Reap relay rooms whose last subscriber disconnected.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            relay.cleanup_idle_rooms();
            tracing::debug!("[Relay] cleaned up idle rooms");
        }
    });

    tracing::info!("Router configured");
    app
}
