use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::ports::NotificationChannel;
use crate::domain::{LeadInteraction, LeadStatus, UnifiedLead};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LeadCreated,
    LeadUpdated,
    StatusChanged,
    InteractionAdded,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::LeadCreated => "lead_created",
            NotificationType::LeadUpdated => "lead_updated",
            NotificationType::StatusChanged => "status_changed",
            NotificationType::InteractionAdded => "interaction_added",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Chat,
    Webhook,
}

impl ChannelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Email => "Email",
            ChannelKind::Chat => "Chat",
            ChannelKind::Webhook => "Webhook",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Event handed to every notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub lead: UnifiedLead,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<LeadInteraction>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn new(kind: NotificationType, lead: UnifiedLead) -> Self {
        Self {
            kind,
            status: lead.status,
            lead,
            interaction: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_interaction(mut self, interaction: LeadInteraction) -> Self {
        self.status = Some(interaction.status);
        self.interaction = Some(interaction);
        self
    }
}

/// Outcome of one delivery. The channel serializes under `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    #[serde(rename = "event")]
    pub kind: NotificationType,
    #[serde(rename = "type")]
    pub channel: ChannelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fans lead events out to the configured channels.
///
/// Every channel slot is optional. Delivery failures are reported in the returned
/// results and never surface as errors.
#[derive(Default, Clone)]
pub struct NotificationService {
    email: Option<Arc<dyn NotificationChannel>>,
    chat: Option<Arc<dyn NotificationChannel>>,
    webhook: Option<Arc<dyn NotificationChannel>>,
}

impl NotificationService {
    /// A service with no channels configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `channel` in the slot matching its kind
    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        match channel.kind() {
            ChannelKind::Email => self.email = Some(channel),
            ChannelKind::Chat => self.chat = Some(channel),
            ChannelKind::Webhook => self.webhook = Some(channel),
        }
        self
    }

    pub fn configured_channels(&self) -> Vec<ChannelKind> {
        [ChannelKind::Email, ChannelKind::Chat, ChannelKind::Webhook]
            .into_iter()
            .filter(|kind| self.slot(*kind).is_some())
            .collect()
    }

    fn slot(&self, kind: ChannelKind) -> Option<&Arc<dyn NotificationChannel>> {
        match kind {
            ChannelKind::Email => self.email.as_ref(),
            ChannelKind::Chat => self.chat.as_ref(),
            ChannelKind::Webhook => self.webhook.as_ref(),
        }
    }

    /// Deliver through one channel; an unconfigured channel is a failed result
    pub async fn send(
        &self,
        kind: ChannelKind,
        payload: &NotificationPayload,
    ) -> NotificationResult {
        let Some(channel) = self.slot(kind) else {
            return NotificationResult {
                success: false,
                kind: payload.kind,
                channel: kind,
                error: Some(format!("{} configuration not provided", kind.label())),
            };
        };

        let result = match channel.deliver(payload).await {
            Ok(()) => {
                debug!("Sent {} notification via {}", payload.kind.as_str(), kind);
                NotificationResult {
                    success: true,
                    kind: payload.kind,
                    channel: kind,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    "Failed to send {} notification via {}: {:#}",
                    payload.kind.as_str(),
                    kind,
                    e
                );
                NotificationResult {
                    success: false,
                    kind: payload.kind,
                    channel: kind,
                    error: Some(format!("{:#}", e)),
                }
            }
        };

        metrics::notifications::notification_sent(
            kind.label(),
            payload.kind.as_str(),
            result.success,
        );
        result
    }

    pub async fn send_email(&self, payload: &NotificationPayload) -> NotificationResult {
        self.send(ChannelKind::Email, payload).await
    }

    pub async fn send_chat(&self, payload: &NotificationPayload) -> NotificationResult {
        self.send(ChannelKind::Chat, payload).await
    }

    pub async fn send_webhook(&self, payload: &NotificationPayload) -> NotificationResult {
        self.send(ChannelKind::Webhook, payload).await
    }

    async fn send_if_configured(
        &self,
        kind: ChannelKind,
        payload: &NotificationPayload,
    ) -> Option<NotificationResult> {
        if self.slot(kind).is_some() {
            Some(self.send(kind, payload).await)
        } else {
            None
        }
    }

    /// Deliver to every configured channel concurrently.
    ///
    /// Results come back in email, chat, webhook order.
    pub async fn notify(&self, payload: &NotificationPayload) -> Vec<NotificationResult> {
        let (email, chat, webhook) = tokio::join!(
            self.send_if_configured(ChannelKind::Email, payload),
            self.send_if_configured(ChannelKind::Chat, payload),
            self.send_if_configured(ChannelKind::Webhook, payload),
        );

        [email, chat, webhook].into_iter().flatten().collect()
    }
}
