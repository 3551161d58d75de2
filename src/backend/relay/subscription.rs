/**
 * Relay Subscription Handler
 *
 * `GET /relay` joins the authenticated user's relay room and streams
 * `messageReceived` events over Server-Sent Events. SSE fits the relay's
 * one-way, notification-only contract and keeps reconnection simple: a
 * client that reconnects refetches its history rather than relying on
 * replay.
 *
 * # Connection Management
 *
 * - Connections are kept alive with the SSE keep-alive mechanism
 * - A lagged receiver skips ahead; missed events are recovered by the
 *   next history refetch, not redelivered
 * - A closed room ends the stream
 */
use std::convert::Infallible;

use axum::{
    extract::State,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream;
use tokio::sync::broadcast::error::RecvError;

use crate::backend::auth::extract_current_user;
use crate::backend::error::ApiError;
use crate::backend::relay::channel::RelayChannel;

/// Handle relay subscription (GET /relay)
pub async fn handle_relay_subscription(
    State(relay): State<RelayChannel>,
    headers: HeaderMap,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let current_user = extract_current_user(&headers)?;
    let rx = relay.join(current_user.id);

    tracing::info!("[Relay] user {} joined their room", current_user.id);

    let stream = stream::unfold(rx, move |mut rx| async move {
        // Loop until there is an event worth emitting; keep-alives are
        // injected by axum, so nothing is sent while the room is quiet.
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let data = match serde_json::to_string(&message) {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("[Relay] failed to serialize event: {:?}", e);
                            continue;
                        }
                    };

                    let event = Event::default().event("messageReceived").data(data);
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    // At-most-once delivery: the skipped events are gone
                    // from this stream; the client recovers them on its
                    // next history refetch.
                    tracing::warn!("[Relay] receiver lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("[Relay] room closed, ending stream");
                    return None;
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(30))
            .text("keep-alive"),
    ))
}
