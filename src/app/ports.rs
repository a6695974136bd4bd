use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::notification_service::{ChannelKind, NotificationPayload};

// Outbound HTTP, used by the webhook-style channels and the mail relay
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &serde_json::Value,
    ) -> Result<HttpPostResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpPostResult {
    pub status: u16,
    pub body: String,
}

impl HttpPostResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransportPort: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// A notification sink; one implementation per channel kind
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn deliver(&self, payload: &NotificationPayload) -> anyhow::Result<()>;
}
