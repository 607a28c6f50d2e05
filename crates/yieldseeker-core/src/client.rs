use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::ChatError;
use crate::models::{AuthToken, ChatHistory, ChatResponse, Message, SendMessageRequest};

/// Which HTTP surface the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStyle {
    /// `POST /chats/{user}/messages`, `GET /chats/{user}/history`
    #[default]
    Sessions,
    /// `POST /chat` with the user id in the body, `GET /chat/{user}`
    Legacy,
}

impl ApiStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStyle::Sessions => "sessions",
            ApiStyle::Legacy => "legacy",
        }
    }
}

impl FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sessions" => Ok(ApiStyle::Sessions),
            "legacy" => Ok(ApiStyle::Legacy),
            other => Err(format!("unknown API style: {}", other)),
        }
    }
}

/// The two calls the chat view makes against its backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(
        &self,
        content: &str,
        user_id: &str,
        credential: Option<&AuthToken>,
    ) -> Result<Message, ChatError>;

    async fn get_chat_history(
        &self,
        user_id: &str,
        credential: Option<&AuthToken>,
    ) -> Result<ChatHistory, ChatError>;
}

/// HTTP client for the Yield Seeker agent API.
///
/// Each call is a single round trip: no retry, no timeout, no caching.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    style: ApiStyle,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(Client::new(), base_url, ApiStyle::default())
    }

    pub fn with_style(base_url: &str, style: ApiStyle) -> Self {
        Self::with_http_client(Client::new(), base_url, style)
    }

    pub fn with_http_client(client: Client, base_url: &str, style: ApiStyle) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            style,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_url(&self, user_id: &str) -> String {
        match self.style {
            ApiStyle::Sessions => format!("{}/chats/{}/messages", self.base_url, user_id),
            ApiStyle::Legacy => format!("{}/chat", self.base_url),
        }
    }

    fn history_url(&self, user_id: &str) -> String {
        match self.style {
            ApiStyle::Sessions => format!("{}/chats/{}/history", self.base_url, user_id),
            ApiStyle::Legacy => format!("{}/chat/{}", self.base_url, user_id),
        }
    }

    fn authorize(request: RequestBuilder, credential: Option<&AuthToken>) -> RequestBuilder {
        match credential {
            Some(token) => request.header("Authorization", token.to_header_value()),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send_message(
        &self,
        content: &str,
        user_id: &str,
        credential: Option<&AuthToken>,
    ) -> Result<Message, ChatError> {
        let url = self.send_url(user_id);
        let body = SendMessageRequest {
            content,
            user_id: match self.style {
                ApiStyle::Sessions => None,
                ApiStyle::Legacy => Some(user_id),
            },
        };

        tracing::debug!(%url, "sending chat message");
        let request = Self::authorize(self.client.post(&url).json(&body), credential);
        let response = request.send().await?;

        let envelope: ChatResponse = Self::read_json(response).await?;
        Ok(envelope.message)
    }

    async fn get_chat_history(
        &self,
        user_id: &str,
        credential: Option<&AuthToken>,
    ) -> Result<ChatHistory, ChatError> {
        let url = self.history_url(user_id);

        tracing::debug!(%url, "fetching chat history");
        let request = Self::authorize(self.client.get(&url), credential);
        let response = request.send().await?;

        Self::read_json(response).await
    }
}
