/**
 * Messaging API Client
 *
 * Async HTTP client for the messaging query/mutation surface. Every call
 * carries the bearer token the external identity provider issued; 401 and
 * 400 responses are mapped to typed errors with the server's message.
 */
use reqwest::{Client, Response, StatusCode};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::shared::{MarkReadResponse, Message, MessagesResponse, SendMessageRequest};

/// HTTP client for the messaging endpoints
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the caller's full message history
    pub async fn get_messages(&self) -> Result<Vec<Message>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/messages"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: MessagesResponse = response.json().await?;
        Ok(body.messages)
    }

    /// Send a message; returns the persisted copy with its server-assigned
    /// id and timestamp
    pub async fn send_message(
        &self,
        receiver_id: Uuid,
        text: impl Into<String>,
    ) -> Result<Message, ClientError> {
        let request = SendMessageRequest {
            receiver_id,
            message: text.into(),
        };

        let response = self
            .client
            .post(self.url("/api/messages"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Fire a read receipt for every message from `counterpart_id`
    pub async fn mark_messages_as_read(
        &self,
        counterpart_id: Uuid,
    ) -> Result<bool, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/api/messages/{}/read", counterpart_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: MarkReadResponse = response.json().await?;
        Ok(body.success)
    }
}

/// Map error statuses to typed failures, extracting the server's error
/// message from the JSON body where present.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .ok()
        .and_then(|body| {
            serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .or(Some(body))
        })
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::NotAuthenticated),
        StatusCode::BAD_REQUEST => Err(ClientError::Rejected(message)),
        _ => Err(ClientError::Server {
            status: status.as_u16(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let api = ApiClient::new("http://localhost:3001/", "token");
        assert_eq!(api.url("/api/messages"), "http://localhost:3001/api/messages");
    }
}
