/**
 * Relay Event Consumer
 *
 * Subscribes to the server's `/relay` SSE endpoint and decodes
 * `messageReceived` events into `Message`s, delivered to the caller over
 * an unbounded mpsc channel. The reader task exits quietly when the
 * stream ends or the caller drops the receiver; reconnection is the
 * caller's decision, paired with a history refetch since missed events
 * are never replayed.
 */
use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::client::error::ClientError;
use crate::shared::Message;

/// SSE consumer for the per-user relay room
#[derive(Clone)]
pub struct RelayClient {
    base_url: String,
    token: String,
    client: Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    /// Join the caller's relay room.
    ///
    /// Returns a receiver of decoded live messages; the underlying reader
    /// task runs until the stream ends or the receiver is dropped.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Message>, ClientError> {
        let response = self
            .client
            .get(format!("{}/relay", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::NotAuthenticated);
        }
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut parser = SseParser::default();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!("[Relay] event stream error: {}", e);
                        break;
                    }
                };

                for message in parser.feed(&chunk) {
                    if tx.send(message).is_err() {
                        // Receiver dropped; stop reading.
                        return;
                    }
                }
            }

            tracing::debug!("[Relay] event stream ended");
        });

        Ok(rx)
    }
}

/// Incremental SSE parser for `messageReceived` events.
///
/// Handles chunk boundaries that fall mid-line and multi-line `data:`
/// fields; comment lines (keep-alives) are ignored. The buffer holds raw
/// bytes and only complete lines are decoded, so a multi-byte UTF-8
/// character split across chunks survives intact.
#[derive(Default)]
struct SseParser {
    buffer: Vec<u8>,
    event_name: String,
    data: String,
}

impl SseParser {
    fn feed(&mut self, chunk: &[u8]) -> Vec<Message> {
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(&self.buffer[..pos])
                .trim_end_matches('\r')
                .to_string();
            self.buffer.drain(..=pos);

            if line.is_empty() {
                if let Some(message) = self.dispatch() {
                    decoded.push(message);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event_name = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            }
            // Lines starting with ':' are keep-alive comments.
        }
        decoded
    }

    fn dispatch(&mut self) -> Option<Message> {
        let result = if self.event_name == "messageReceived" && !self.data.is_empty() {
            match serde_json::from_str::<Message>(&self.data) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!("[Relay] undecodable event payload: {}", e);
                    None
                }
            }
        } else {
            None
        };

        self.event_name.clear();
        self.data.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::UserRef;
    use chrono::Utc;
    use uuid::Uuid;

    fn event_bytes(message: &Message) -> Vec<u8> {
        format!(
            "event: messageReceived\ndata: {}\n\n",
            serde_json::to_string(message).unwrap()
        )
        .into_bytes()
    }

    fn sample() -> Message {
        Message {
            id: Uuid::new_v4(),
            sender: UserRef::new(Uuid::new_v4()),
            receiver: UserRef::new(Uuid::new_v4()),
            message: "hi".to_string(),
            timestamp: Utc::now(),
            read: false,
        }
    }

    #[test]
    fn test_parses_single_event() {
        let msg = sample();
        let mut parser = SseParser::default();

        let decoded = parser.feed(&event_bytes(&msg));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, msg.id);
    }

    #[test]
    fn test_handles_chunk_split_mid_line() {
        let msg = sample();
        let bytes = event_bytes(&msg);
        let (head, tail) = bytes.split_at(bytes.len() / 2);

        let mut parser = SseParser::default();
        assert!(parser.feed(head).is_empty());

        let decoded = parser.feed(tail);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, msg.id);
    }

    #[test]
    fn test_chunk_split_inside_multibyte_char() {
        let mut msg = sample();
        msg.message = "héllo wörld".to_string();
        let bytes = event_bytes(&msg);

        // Find a multi-byte character and split in the middle of it.
        let split = bytes
            .iter()
            .position(|&b| b >= 0x80)
            .map(|p| p + 1)
            .unwrap();
        let (head, tail) = bytes.split_at(split);

        let mut parser = SseParser::default();
        assert!(parser.feed(head).is_empty());

        let decoded = parser.feed(tail);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].message, "héllo wörld");
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let mut msg = sample();
        msg.message = "ça va".to_string();
        let bytes = event_bytes(&msg);

        let mut parser = SseParser::default();
        let mut decoded = Vec::new();
        for b in bytes {
            decoded.extend(parser.feed(&[b]));
        }

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].message, "ça va");
    }

    #[test]
    fn test_ignores_keep_alive_comments() {
        let mut parser = SseParser::default();
        let decoded = parser.feed(b": keep-alive\n\n");
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_ignores_other_event_types() {
        let msg = sample();
        let bytes = format!(
            "event: somethingElse\ndata: {}\n\n",
            serde_json::to_string(&msg).unwrap()
        );

        let mut parser = SseParser::default();
        assert!(parser.feed(bytes.as_bytes()).is_empty());
    }

    #[test]
    fn test_parses_consecutive_events() {
        let (m1, m2) = (sample(), sample());
        let mut bytes = event_bytes(&m1);
        bytes.extend(event_bytes(&m2));

        let mut parser = SseParser::default();
        let decoded = parser.feed(&bytes);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, m1.id);
        assert_eq!(decoded[1].id, m2.id);
    }
}
