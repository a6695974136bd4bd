use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::notification_service::{
    ChannelKind, NotificationPayload, NotificationService, NotificationType,
};
use crate::app::ports::{HttpClientPort, MailMessage, MailTransportPort, NotificationChannel};
use crate::constants;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub chat: Option<ChatConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

/// Email delivery through an HTTP mail relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub relay_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

/// Slack-compatible incoming webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Build a service with a channel for every configured section
pub fn build_notification_service(
    config: &NotificationsConfig,
    http: Arc<dyn HttpClientPort>,
) -> NotificationService {
    let mut service = NotificationService::new();

    if let Some(email) = &config.email {
        let transport = Arc::new(HttpMailRelay::new(
            http.clone(),
            email.relay_url.clone(),
            email.api_key.clone(),
        ));
        service = service.with_channel(Arc::new(EmailChannel::new(email.clone(), transport)));
    }
    if let Some(chat) = &config.chat {
        service = service.with_channel(Arc::new(ChatChannel::new(chat.clone(), http.clone())));
    }
    if let Some(webhook) = &config.webhook {
        service = service.with_channel(Arc::new(WebhookChannel::new(webhook.clone(), http)));
    }

    service
}

pub fn email_subject(payload: &NotificationPayload) -> String {
    let name = &payload.lead.name;
    match payload.kind {
        NotificationType::LeadCreated => format!("New Lead: {}", name),
        NotificationType::LeadUpdated => format!("Lead Updated: {}", name),
        NotificationType::StatusChanged => format!(
            "Lead Status Changed: {} - {}",
            name,
            payload.status.or(payload.lead.status).unwrap_or_default()
        ),
        NotificationType::InteractionAdded => match &payload.interaction {
            Some(interaction) => format!("New Interaction: {} - {}", name, interaction.kind),
            None => format!("New Interaction: {}", name),
        },
    }
}

fn event_line(payload: &NotificationPayload) -> String {
    match payload.kind {
        NotificationType::LeadCreated => "A new lead has been created.".to_string(),
        NotificationType::LeadUpdated => "A lead has been updated.".to_string(),
        NotificationType::StatusChanged => format!(
            "Lead status changed to {}.",
            payload.status.or(payload.lead.status).unwrap_or_default()
        ),
        NotificationType::InteractionAdded => match &payload.interaction {
            Some(interaction) => {
                format!("New {} interaction: {}", interaction.kind, interaction.content)
            }
            None => "A new interaction has been recorded.".to_string(),
        },
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Label/value rows describing the lead, shared by the email and chat formats
fn lead_rows(payload: &NotificationPayload) -> Vec<(&'static str, String)> {
    let lead = &payload.lead;
    let mut rows = vec![
        ("Domain", lead.name.clone()),
        ("Source", lead.source.to_string()),
        ("Price", lead.price.clone()),
        ("Category", lead.category.clone()),
    ];
    if let Some(traffic) = &lead.traffic {
        rows.push(("Traffic", traffic.clone()));
    }
    rows.push(("Seller", lead.seller.name.clone()));
    if let Some(email) = &lead.seller.email {
        rows.push(("Seller Email", email.clone()));
    }
    if let Some(size) = lead.seller.portfolio_size {
        rows.push(("Portfolio Size", size.to_string()));
    }
    rows.push(("Status", lead.status.unwrap_or_default().to_string()));
    rows
}

pub fn email_html(payload: &NotificationPayload) -> String {
    let mut html = String::new();
    html.push_str(&format!("<h2>{}</h2>\n", escape_html(&email_subject(payload))));
    html.push_str(&format!("<p>{}</p>\n", escape_html(&event_line(payload))));
    html.push_str("<table>\n");
    for (label, value) in lead_rows(payload) {
        html.push_str(&format!(
            "  <tr><th align=\"left\">{}</th><td>{}</td></tr>\n",
            label,
            escape_html(&value)
        ));
    }
    html.push_str("</table>\n");
    html.push_str(&format!(
        "<p><small>{}</small></p>\n",
        payload.timestamp.to_rfc3339()
    ));
    html
}

pub fn chat_text(payload: &NotificationPayload) -> String {
    let mut lines = vec![format!("*{}*", email_subject(payload)), event_line(payload)];
    for (label, value) in lead_rows(payload) {
        lines.push(format!("{}: {}", label, value));
    }
    lines.join("\n")
}

pub struct EmailChannel {
    config: EmailConfig,
    transport: Arc<dyn MailTransportPort>,
}

impl EmailChannel {
    pub fn new(config: EmailConfig, transport: Arc<dyn MailTransportPort>) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        if self.config.to.is_empty() {
            return Err(anyhow!("Email configuration has no recipients"));
        }
        let message = MailMessage {
            from: self.config.from.clone(),
            to: self.config.to.clone(),
            subject: email_subject(payload),
            html: email_html(payload),
        };
        self.transport.send(&message).await
    }
}

/// Mail transport that hands messages to an HTTP relay as JSON
pub struct HttpMailRelay {
    http: Arc<dyn HttpClientPort>,
    relay_url: String,
    api_key: Option<String>,
}

impl HttpMailRelay {
    pub fn new(http: Arc<dyn HttpClientPort>, relay_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            relay_url,
            api_key,
        }
    }
}

#[async_trait]
impl MailTransportPort for HttpMailRelay {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let headers: Vec<(String, String)> = self
            .api_key
            .iter()
            .map(|key| ("Authorization".to_string(), format!("Bearer {}", key)))
            .collect();
        let body = serde_json::to_value(message).context("Failed to encode mail message")?;

        let resp = self
            .http
            .post_json(&self.relay_url, &headers, &body)
            .await
            .map_err(|e| anyhow!("Mail relay request failed: {}", e))?;
        if !resp.is_success() {
            return Err(anyhow!("Mail relay responded with status {}", resp.status));
        }
        Ok(())
    }
}

pub struct ChatChannel {
    config: ChatConfig,
    http: Arc<dyn HttpClientPort>,
}

impl ChatChannel {
    pub fn new(config: ChatConfig, http: Arc<dyn HttpClientPort>) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl NotificationChannel for ChatChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    async fn deliver(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        let body = json!({
            "channel": self.config.channel.as_deref().unwrap_or(constants::DEFAULT_CHAT_CHANNEL),
            "username": self.config.username.as_deref().unwrap_or(constants::DEFAULT_CHAT_USERNAME),
            "text": chat_text(payload),
        });

        let resp = self
            .http
            .post_json(&self.config.webhook_url, &[], &body)
            .await
            .map_err(|e| anyhow!("Chat webhook request failed: {}", e))?;
        if !resp.is_success() {
            return Err(anyhow!("Chat webhook responded with status {}", resp.status));
        }
        Ok(())
    }
}

pub struct WebhookChannel {
    config: WebhookConfig,
    http: Arc<dyn HttpClientPort>,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig, http: Arc<dyn HttpClientPort>) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn deliver(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        let headers: Vec<(String, String)> = self
            .config
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let body = serde_json::to_value(payload).context("Failed to encode notification payload")?;

        let resp = self
            .http
            .post_json(&self.config.url, &headers, &body)
            .await
            .map_err(|e| anyhow!("Webhook request failed: {}", e))?;
        if !resp.is_success() {
            return Err(anyhow!("Webhook responded with status {}", resp.status));
        }
        Ok(())
    }
}
