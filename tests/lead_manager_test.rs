use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use domain_prospector::app::lead_manager_use_case::{
    AutoQualifyRule, LeadAction, LeadManagementConfig, LeadManager,
};
use domain_prospector::app::notification_service::{
    ChannelKind, NotificationPayload, NotificationService, NotificationType,
};
use domain_prospector::app::ports::NotificationChannel;
use domain_prospector::domain::{
    InteractionType, LeadSource, LeadStatus, NewInteraction, UnifiedLead,
};
use domain_prospector::storage::{InMemoryLeadStore, LeadStore};

/// Channel that records every payload and optionally fails
struct RecordingChannel {
    kind: ChannelKind,
    fail: bool,
    payloads: Arc<Mutex<Vec<NotificationPayload>>>,
}

impl RecordingChannel {
    fn new(kind: ChannelKind, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail,
            payloads: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn deliver(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        self.payloads.lock().await.push(payload.clone());
        if self.fail {
            anyhow::bail!("{} sink unavailable", self.kind);
        }
        Ok(())
    }
}

fn auto_qualify_config() -> LeadManagementConfig {
    LeadManagementConfig {
        default_status: None,
        auto_qualify: Some(AutoQualifyRule {
            min_portfolio_size: Some(10),
            min_price: Some(100.0),
            max_price: Some(1000.0),
            categories: vec!["Technology".to_string()],
        }),
    }
}

fn test_lead(price: &str, portfolio_size: u32) -> UnifiedLead {
    let mut lead = UnifiedLead::new(LeadSource::Sedo, "test.com", price, "Technology");
    lead.traffic = Some("1000".to_string());
    lead.seller.name = "Test Seller".to_string();
    lead.seller.portfolio_size = Some(portfolio_size);
    lead
}

fn manager_with(
    store: Arc<InMemoryLeadStore>,
    notifier: NotificationService,
    config: LeadManagementConfig,
) -> LeadManager {
    LeadManager::new(store, notifier, config)
}

#[tokio::test]
async fn test_create_qualifies_lead_meeting_every_bound() {
    let store = Arc::new(InMemoryLeadStore::new());
    let manager = manager_with(store.clone(), NotificationService::new(), auto_qualify_config());

    let result = manager
        .execute(LeadAction::create(test_lead("$500", 15)))
        .await
        .unwrap();

    assert_eq!(result.status, LeadStatus::Qualified);
    assert_eq!(result.lead.id, Some(1));
    assert!(result.interactions.is_empty());

    let stored = store.get(1).await.unwrap().unwrap();
    assert_eq!(stored.status, Some(LeadStatus::Qualified));
}

#[tokio::test]
async fn test_create_falls_back_to_new_below_thresholds() {
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new(),
        auto_qualify_config(),
    );

    let result = manager
        .execute(LeadAction::create(test_lead("$50", 5)))
        .await
        .unwrap();

    assert_eq!(result.status, LeadStatus::New);
}

#[tokio::test]
async fn test_create_discards_caller_status_unless_promoted() {
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new(),
        auto_qualify_config(),
    );

    let mut closed = test_lead("$50", 5);
    closed.status = Some(LeadStatus::Closed);
    let result = manager.execute(LeadAction::create(closed)).await.unwrap();
    assert_eq!(result.status, LeadStatus::New);

    let mut rejected = test_lead("$50", 5);
    rejected.status = Some(LeadStatus::Rejected);
    let result = manager
        .execute(LeadAction::create_promoted(rejected, LeadStatus::Qualified))
        .await
        .unwrap();
    assert_eq!(result.status, LeadStatus::Qualified);
    assert_eq!(result.lead.id, Some(2));
}

#[tokio::test]
async fn test_interact_records_interaction_and_moves_status() {
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new(),
        LeadManagementConfig::default(),
    );
    manager
        .execute(LeadAction::create(test_lead("$500", 15)))
        .await
        .unwrap();

    let result = manager
        .execute(LeadAction::Interact(NewInteraction {
            lead_id: 1,
            kind: InteractionType::Email,
            content: "Initial contact made".to_string(),
            status: LeadStatus::Contacted,
        }))
        .await
        .unwrap();

    assert_eq!(result.interactions.len(), 1);
    assert!(result.interactions[0].id > 0);
    assert_eq!(result.interactions[0].content, "Initial contact made");
    assert_eq!(result.status, LeadStatus::Contacted);
    assert_eq!(result.lead.status, Some(LeadStatus::Contacted));
}

#[tokio::test]
async fn test_interactions_come_back_newest_first() {
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new(),
        LeadManagementConfig::default(),
    );
    manager
        .execute(LeadAction::create(test_lead("$500", 15)))
        .await
        .unwrap();

    for (content, status) in [
        ("Initial contact made", LeadStatus::Contacted),
        ("Sent counter offer", LeadStatus::Negotiating),
        ("Deal signed", LeadStatus::Closed),
    ] {
        manager
            .execute(LeadAction::Interact(NewInteraction {
                lead_id: 1,
                kind: InteractionType::Note,
                content: content.to_string(),
                status,
            }))
            .await
            .unwrap();
    }

    let store_result = manager.store().list_interactions(1).await.unwrap();
    let contents: Vec<_> = store_result.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["Deal signed", "Sent counter offer", "Initial contact made"]
    );
    let lead = manager.store().get(1).await.unwrap().unwrap();
    assert_eq!(lead.status, Some(LeadStatus::Closed));
}

#[tokio::test]
async fn test_failing_notifications_never_undo_the_write() {
    let email = RecordingChannel::new(ChannelKind::Email, true);
    let chat = RecordingChannel::new(ChannelKind::Chat, false);
    let webhook = RecordingChannel::new(ChannelKind::Webhook, true);
    let notifier = NotificationService::new()
        .with_channel(email.clone())
        .with_channel(chat.clone())
        .with_channel(webhook.clone());

    let store = Arc::new(InMemoryLeadStore::new());
    let manager = manager_with(store.clone(), notifier, auto_qualify_config());

    let result = manager
        .execute(LeadAction::create(test_lead("$500", 15)))
        .await
        .unwrap();

    assert_eq!(result.notifications.len(), 3);
    let failed: Vec<_> = result
        .notifications
        .iter()
        .filter(|n| !n.success)
        .map(|n| n.channel)
        .collect();
    assert_eq!(failed, vec![ChannelKind::Email, ChannelKind::Webhook]);
    assert_eq!(store.list().await.unwrap().len(), 1);

    let delivered = chat.payloads.lock().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, NotificationType::LeadCreated);
    assert_eq!(delivered[0].lead.id, Some(1));
}

#[tokio::test]
async fn test_each_action_emits_its_notification_type() {
    let chat = RecordingChannel::new(ChannelKind::Chat, false);
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new().with_channel(chat.clone()),
        LeadManagementConfig::default(),
    );

    let created = manager
        .execute(LeadAction::create(test_lead("$500", 15)))
        .await
        .unwrap();

    let mut update = created.lead.clone();
    update.status = Some(LeadStatus::Negotiating);
    manager.execute(LeadAction::Update(update)).await.unwrap();

    manager
        .execute(LeadAction::Interact(NewInteraction {
            lead_id: 1,
            kind: InteractionType::Call,
            content: "Discussed pricing".to_string(),
            status: LeadStatus::Negotiating,
        }))
        .await
        .unwrap();

    let kinds: Vec<_> = chat.payloads.lock().await.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationType::LeadCreated,
            NotificationType::LeadUpdated,
            NotificationType::InteractionAdded
        ]
    );
    let payloads = chat.payloads.lock().await;
    assert_eq!(
        payloads[2].interaction.as_ref().map(|i| i.kind),
        Some(InteractionType::Call)
    );
}

#[tokio::test]
async fn test_update_of_unknown_lead_is_not_found() {
    let manager = manager_with(
        Arc::new(InMemoryLeadStore::new()),
        NotificationService::new(),
        LeadManagementConfig::default(),
    );

    let mut ghost = test_lead("$500", 15);
    ghost.id = Some(404);
    let err = manager.execute(LeadAction::Update(ghost)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unconfigured_service_reports_every_channel_missing() {
    let service = NotificationService::new();
    let payload = NotificationPayload::new(NotificationType::LeadCreated, test_lead("$500", 15));

    for (result, channel) in [
        (service.send_email(&payload).await, "Email"),
        (service.send_chat(&payload).await, "Chat"),
        (service.send_webhook(&payload).await, "Webhook"),
    ] {
        assert!(!result.success);
        assert_eq!(result.kind, NotificationType::LeadCreated);
        assert_eq!(
            result.error,
            Some(format!("{} configuration not provided", channel))
        );
    }
}
