use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::app::notification_service::{
    NotificationPayload, NotificationResult, NotificationService, NotificationType,
};
use crate::domain::{LeadInteraction, LeadStatus, NewInteraction, UnifiedLead};
use crate::error::{ProspectorError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::filter::{FilterConfig, LeadFilter};
use crate::storage::{LeadPatch, LeadStore};

/// Thresholds a new lead must all meet to start out qualified
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoQualifyRule {
    /// Fails when the seller's portfolio size is unknown
    #[serde(default, alias = "minPortfolioSize")]
    pub min_portfolio_size: Option<u32>,
    #[serde(default, alias = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(default, alias = "maxPrice")]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl AutoQualifyRule {
    /// Same checks as the lead filter, applied to a single lead
    pub fn should_auto_qualify(&self, lead: &UnifiedLead) -> bool {
        LeadFilter::new(FilterConfig {
            min_portfolio_size: self.min_portfolio_size,
            min_price: self.min_price,
            max_price: self.max_price,
            categories: self.categories.clone(),
            exclude_categories: Vec::new(),
        })
        .accepts(lead)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadManagementConfig {
    #[serde(default, alias = "defaultStatus")]
    pub default_status: Option<LeadStatus>,
    #[serde(default, alias = "autoQualify")]
    pub auto_qualify: Option<AutoQualifyRule>,
}

#[derive(Debug, Clone)]
pub enum LeadAction {
    /// `promoted` is the status granted by score-based auto-qualification, if any;
    /// any status already on `lead` is ignored
    Create {
        lead: UnifiedLead,
        promoted: Option<LeadStatus>,
    },
    /// Full lead record carrying its id and the desired status
    Update(UnifiedLead),
    Interact(NewInteraction),
}

impl LeadAction {
    pub fn create(lead: UnifiedLead) -> Self {
        LeadAction::Create {
            lead,
            promoted: None,
        }
    }

    pub fn create_promoted(lead: UnifiedLead, status: LeadStatus) -> Self {
        LeadAction::Create {
            lead,
            promoted: Some(status),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LeadAction::Create { .. } => "create",
            LeadAction::Update(_) => "update",
            LeadAction::Interact(_) => "interact",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadManagementResult {
    pub lead: UnifiedLead,
    pub status: LeadStatus,
    /// Newest first
    pub interactions: Vec<LeadInteraction>,
    pub last_updated: DateTime<Utc>,
    pub notifications: Vec<NotificationResult>,
}

/// Applies status transitions, persists them and announces them.
///
/// Notifications go out only after the write succeeded and never change the outcome.
pub struct LeadManager {
    store: Arc<dyn LeadStore>,
    notifier: NotificationService,
    config: LeadManagementConfig,
}

impl LeadManager {
    pub fn new(
        store: Arc<dyn LeadStore>,
        notifier: NotificationService,
        config: LeadManagementConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    #[instrument(skip(self, action), fields(action = action.name()))]
    pub async fn execute(&self, action: LeadAction) -> Result<LeadManagementResult> {
        match action {
            LeadAction::Create { lead, promoted } => self.create(lead, promoted).await,
            LeadAction::Update(lead) => self.update(lead).await,
            LeadAction::Interact(interaction) => self.interact(interaction).await,
        }
    }

    /// Status a new lead starts with: the manager's rule, then a score promotion,
    /// then the configured default
    pub fn initial_status(&self, lead: &UnifiedLead, promoted: Option<LeadStatus>) -> LeadStatus {
        let qualifies = self
            .config
            .auto_qualify
            .as_ref()
            .is_some_and(|rule| rule.should_auto_qualify(lead));

        if qualifies {
            LeadStatus::Qualified
        } else if let Some(status) = promoted {
            status
        } else {
            self.config.default_status.unwrap_or_default()
        }
    }

    async fn create(
        &self,
        mut lead: UnifiedLead,
        promoted: Option<LeadStatus>,
    ) -> Result<LeadManagementResult> {
        let status = self.initial_status(&lead, promoted);
        lead.status = Some(status);

        let stored = self.store.create(&lead).await?;
        info!(
            "Persisted lead {} ({}) with status {}",
            stored.name,
            stored.id.unwrap_or_default(),
            status
        );
        metrics::qualify::lead_created(status.as_str());

        let notifications = self
            .announce(NotificationPayload::new(NotificationType::LeadCreated, stored.clone()))
            .await;

        Ok(Self::result(stored, Vec::new(), notifications))
    }

    async fn update(&self, lead: UnifiedLead) -> Result<LeadManagementResult> {
        let id = lead
            .id
            .ok_or_else(|| ProspectorError::MissingField("id".to_string()))?;

        let mut patch = LeadPatch::from_lead(&lead);
        if lead.version > 0 {
            patch = patch.with_expected_version(lead.version);
        }

        let stored = self
            .store
            .update(id, patch)
            .await?
            .ok_or(ProspectorError::LeadNotFound { id })?;
        info!("Updated lead {} to status {}", id, Self::status_of(&stored));
        metrics::qualify::lead_updated(Self::status_of(&stored).as_str());

        let notifications = self
            .announce(NotificationPayload::new(NotificationType::LeadUpdated, stored.clone()))
            .await;

        let interactions = self.store.list_interactions(id).await?;
        Ok(Self::result(stored, interactions, notifications))
    }

    async fn interact(&self, interaction: NewInteraction) -> Result<LeadManagementResult> {
        let id = interaction.lead_id;
        let (stored, recorded) = self
            .store
            .add_interaction(interaction)
            .await?
            .ok_or(ProspectorError::LeadNotFound { id })?;
        info!(
            "Recorded {} interaction {} on lead {}; status now {}",
            recorded.kind, recorded.id, id, recorded.status
        );
        metrics::qualify::interaction_added(recorded.status.as_str());

        let notifications = self
            .announce(
                NotificationPayload::new(NotificationType::InteractionAdded, stored.clone())
                    .with_interaction(recorded),
            )
            .await;

        let interactions = self.store.list_interactions(id).await?;
        Ok(Self::result(stored, interactions, notifications))
    }

    async fn announce(&self, payload: NotificationPayload) -> Vec<NotificationResult> {
        let results = self.notifier.notify(&payload).await;
        for failed in results.iter().filter(|r| !r.success) {
            warn!(
                "Notification via {} failed for lead {}: {}",
                failed.channel,
                payload.lead.name,
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
        results
    }

    fn status_of(lead: &UnifiedLead) -> LeadStatus {
        lead.status.unwrap_or_default()
    }

    fn result(
        lead: UnifiedLead,
        interactions: Vec<LeadInteraction>,
        notifications: Vec<NotificationResult>,
    ) -> LeadManagementResult {
        LeadManagementResult {
            status: Self::status_of(&lead),
            last_updated: lead.updated_at.unwrap_or_else(Utc::now),
            lead,
            interactions,
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InteractionType, LeadSource};
    use crate::storage::InMemoryLeadStore;

    fn rule() -> AutoQualifyRule {
        AutoQualifyRule {
            min_portfolio_size: Some(10),
            min_price: Some(100.0),
            max_price: Some(1000.0),
            categories: vec!["Technology".to_string()],
        }
    }

    fn manager(config: LeadManagementConfig) -> LeadManager {
        LeadManager::new(
            Arc::new(InMemoryLeadStore::new()),
            NotificationService::new(),
            config,
        )
    }

    fn test_lead(price: &str, portfolio: u32) -> UnifiedLead {
        let mut lead = UnifiedLead::new(LeadSource::Sedo, "test.com", price, "Technology");
        lead.traffic = Some("1000".to_string());
        lead.seller.portfolio_size = Some(portfolio);
        lead
    }

    #[test]
    fn test_auto_qualify_requires_every_bound() {
        let rule = rule();
        assert!(rule.should_auto_qualify(&test_lead("$500", 15)));
        assert!(!rule.should_auto_qualify(&test_lead("$500", 5)));
        assert!(!rule.should_auto_qualify(&test_lead("$5000", 15)));

        let mut unknown_portfolio = test_lead("$500", 15);
        unknown_portfolio.seller.portfolio_size = None;
        assert!(!rule.should_auto_qualify(&unknown_portfolio));
    }

    #[test]
    fn test_initial_status_precedence() {
        let manager = manager(LeadManagementConfig {
            default_status: Some(LeadStatus::Contacted),
            auto_qualify: Some(rule()),
        });

        assert_eq!(
            manager.initial_status(&test_lead("$500", 15), None),
            LeadStatus::Qualified
        );
        assert_eq!(
            manager.initial_status(&test_lead("$50", 5), None),
            LeadStatus::Contacted
        );
        assert_eq!(
            manager.initial_status(&test_lead("$50", 5), Some(LeadStatus::Qualified)),
            LeadStatus::Qualified
        );

        let mut preset = test_lead("$50", 5);
        preset.status = Some(LeadStatus::Negotiating);
        assert_eq!(manager.initial_status(&preset, None), LeadStatus::Contacted);
    }

    #[tokio::test]
    async fn test_create_ignores_incoming_status() {
        let manager = manager(LeadManagementConfig::default());
        let mut closed = test_lead("$50", 5);
        closed.status = Some(LeadStatus::Closed);

        let result = manager.execute(LeadAction::create(closed)).await.unwrap();
        assert_eq!(result.status, LeadStatus::New);
        assert_eq!(result.lead.status, Some(LeadStatus::New));
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let manager = manager(LeadManagementConfig::default());
        let err = manager
            .execute(LeadAction::Update(test_lead("$500", 15)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProspectorError::MissingField(ref f) if f == "id"));
    }

    #[tokio::test]
    async fn test_interact_on_missing_lead_is_not_found() {
        let manager = manager(LeadManagementConfig::default());
        let err = manager
            .execute(LeadAction::Interact(NewInteraction {
                lead_id: 99,
                kind: InteractionType::Call,
                content: "Left voicemail".to_string(),
                status: LeadStatus::Contacted,
            }))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_accepts_any_status() {
        let manager = manager(LeadManagementConfig::default());
        let created = manager
            .execute(LeadAction::create(test_lead("$500", 15)))
            .await
            .unwrap();

        let mut closed = created.lead.clone();
        closed.status = Some(LeadStatus::Closed);
        let updated = manager.execute(LeadAction::Update(closed)).await.unwrap();
        assert_eq!(updated.status, LeadStatus::Closed);

        // Back out of a conventionally terminal state
        let mut reopened = updated.lead.clone();
        reopened.status = Some(LeadStatus::New);
        let reopened = manager.execute(LeadAction::Update(reopened)).await.unwrap();
        assert_eq!(reopened.status, LeadStatus::New);
    }

    #[tokio::test]
    async fn test_stale_update_is_a_storage_error() {
        let manager = manager(LeadManagementConfig::default());
        let created = manager
            .execute(LeadAction::create(test_lead("$500", 15)))
            .await
            .unwrap();

        let mut first = created.lead.clone();
        first.status = Some(LeadStatus::Contacted);
        manager.execute(LeadAction::Update(first)).await.unwrap();

        let mut stale = created.lead;
        stale.status = Some(LeadStatus::Rejected);
        let err = manager.execute(LeadAction::Update(stale)).await.unwrap_err();
        assert!(matches!(err, ProspectorError::Storage(_)));
        assert!(!err.is_not_found());
    }
}
