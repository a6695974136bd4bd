// Lead persistence: the store trait the manager writes through, plus backends

pub mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    LeadInteraction, LeadMetadata, LeadStatus, NewInteraction, Seller, UnifiedLead,
};

pub use in_memory::InMemoryLeadStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("version conflict on lead {id}: expected {expected}, found {actual}")]
    VersionConflict { id: u64, expected: u64, actual: u64 },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Partial update applied by [`LeadStore::update`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub traffic: Option<Option<String>>,
    pub seller: Option<Seller>,
    pub metadata: Option<LeadMetadata>,
    pub status: Option<LeadStatus>,
    /// When set, the update only applies if the stored version matches
    pub expected_version: Option<u64>,
}

impl LeadPatch {
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch replacing every mutable field with the values carried by `lead`
    pub fn from_lead(lead: &UnifiedLead) -> Self {
        Self {
            name: Some(lead.name.clone()),
            price: Some(lead.price.clone()),
            category: Some(lead.category.clone()),
            traffic: Some(lead.traffic.clone()),
            seller: Some(lead.seller.clone()),
            metadata: Some(lead.metadata.clone()),
            status: lead.status,
            expected_version: None,
        }
    }

    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub(crate) fn apply_to(self, lead: &mut UnifiedLead) {
        if let Some(name) = self.name {
            lead.name = name;
        }
        if let Some(price) = self.price {
            lead.price = price;
        }
        if let Some(category) = self.category {
            lead.category = category;
        }
        if let Some(traffic) = self.traffic {
            lead.traffic = traffic;
        }
        if let Some(seller) = self.seller {
            lead.seller = seller;
        }
        if let Some(metadata) = self.metadata {
            lead.metadata = metadata;
        }
        if let Some(status) = self.status {
            lead.status = Some(status);
        }
    }
}

/// Storage for leads and their interactions.
///
/// Absence is reported as `Ok(None)` so callers can tell a missing id apart from a
/// backend failure. Concurrent writers to the same lead id are only detected when
/// the caller supplies `LeadPatch::expected_version`.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist a new lead, assigning its id, timestamps and version.
    async fn create(&self, lead: &UnifiedLead) -> StorageResult<UnifiedLead>;
    async fn get(&self, id: u64) -> StorageResult<Option<UnifiedLead>>;
    async fn update(&self, id: u64, patch: LeadPatch) -> StorageResult<Option<UnifiedLead>>;

    /// Record an interaction and move the lead to the interaction's status in one step.
    async fn add_interaction(
        &self,
        interaction: NewInteraction,
    ) -> StorageResult<Option<(UnifiedLead, LeadInteraction)>>;

    /// Interactions for a lead, newest first.
    async fn list_interactions(&self, lead_id: u64) -> StorageResult<Vec<LeadInteraction>>;

    async fn list(&self) -> StorageResult<Vec<UnifiedLead>>;
    async fn search(&self, query: &str) -> StorageResult<Vec<UnifiedLead>>;
    async fn filter_by_status(&self, status: LeadStatus) -> StorageResult<Vec<UnifiedLead>>;
    async fn delete(&self, id: u64) -> StorageResult<bool>;
}
