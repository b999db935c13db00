//! Backend HTTP API for chat history, sends and notifications.

use crate::{ApiError, ApiResult, EntityId, Message, Notification};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Body of `GET /chat/history/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub direct_messages: Vec<Message>,
    /// Group id to that group's messages.
    #[serde(default)]
    pub group_chats: BTreeMap<String, Vec<Message>>,
}

/// Body of `POST /chat/send_direct` and `POST /chat/send_group`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendRequest {
    pub sender_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<EntityId>,
    pub content: String,
}

impl SendRequest {
    fn path(&self) -> &'static str {
        if self.group_id.is_some() {
            "/chat/send_group"
        } else {
            "/chat/send_direct"
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    message: Option<Message>,
}

/// Body of `GET /notifications`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFeed {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread: i64,
}

/// The chat backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_history(&self, user_id: &EntityId) -> ApiResult<HistoryResponse>;

    /// Returns the stored message when the backend echoes it back.
    async fn send_message(&self, request: &SendRequest) -> ApiResult<Option<Message>>;

    async fn fetch_notifications(&self) -> ApiResult<NotificationFeed>;

    async fn mark_notification_read(&self, id: &EntityId) -> ApiResult<()>;
}

/// [`ChatApi`] over reqwest with bearer authentication.
pub struct HttpChatApi {
    base_url: String,
    client: Client,
    auth_token: Option<String>,
}

impl HttpChatApi {
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<String>) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_history(&self, user_id: &EntityId) -> ApiResult<HistoryResponse> {
        let url = self.url(&format!(
            "/chat/history/?user_id={}",
            urlencoding::encode(&user_id.to_string())
        ));
        debug!(url = %url, "Fetching chat history");

        let response = self.authorize(self.client.get(&url)).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_message(&self, request: &SendRequest) -> ApiResult<Option<Message>> {
        let url = self.url(request.path());
        debug!(url = %url, "Sending chat message");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;

        // An empty or unrecognised success body still counts as sent.
        Ok(serde_json::from_str::<SendResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.message))
    }

    async fn fetch_notifications(&self) -> ApiResult<NotificationFeed> {
        let url = self.url("/notifications");
        debug!(url = %url, "Fetching notifications");

        let response = self.authorize(self.client.get(&url)).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn mark_notification_read(&self, id: &EntityId) -> ApiResult<()> {
        let url = self.url(&format!(
            "/notifications/{}/read",
            urlencoding::encode(&id.to_string())
        ));
        debug!(url = %url, "Marking notification read");

        let response = self.authorize(self.client.post(&url)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
