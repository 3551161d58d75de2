/**
 * Router Configuration
 *
 * All HTTP routes for the messaging core:
 *
 * - `GET  /api/messages` - full history for the authenticated caller
 * - `POST /api/messages` - send a message (persist, then relay)
 * - `POST /api/messages/{counterpart_id}/read` - read receipt
 * - `GET  /relay` - SSE subscription to the caller's relay room
 *
 * Post/comment/friend/profile routes belong to other subsystems and are
 * not mounted here.
 */
use axum::{routing::get, routing::post, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::messaging::handlers;
use crate::backend::relay::subscription::handle_relay_subscription;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route(
            "/api/messages",
            get(handlers::get_messages).post(handlers::send_message),
        )
        .route(
            "/api/messages/{counterpart_id}/read",
            post(handlers::mark_messages_read),
        )
        .route("/relay", get(handle_relay_subscription))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .fallback(|| async { "404 Not Found" })
        .with_state(app_state)
}
