use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{LeadPatch, LeadStore, StorageError, StorageResult};
use crate::domain::{LeadInteraction, LeadStatus, NewInteraction, UnifiedLead};

#[derive(Default)]
struct StoreState {
    leads: BTreeMap<u64, UnifiedLead>,
    interactions: HashMap<u64, Vec<LeadInteraction>>,
    next_lead_id: u64,
    next_interaction_id: u64,
}

/// In-memory lead store for development and testing.
///
/// Leads and interactions share one lock so an interaction and the status change it
/// carries are never observed separately.
#[derive(Clone)]
pub struct InMemoryLeadStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for InMemoryLeadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                next_lead_id: 1,
                next_interaction_id: 1,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| StorageError::Backend(format!("lead store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, lead: &UnifiedLead) -> StorageResult<UnifiedLead> {
        let mut state = self.lock()?;
        let id = state.next_lead_id;
        state.next_lead_id += 1;

        let now = Utc::now();
        let mut stored = lead.clone();
        stored.id = Some(id);
        stored.status = Some(lead.status.unwrap_or_default());
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        stored.version = 1;

        state.leads.insert(id, stored.clone());
        debug!("Created lead: {} with id {}", stored.name, id);
        Ok(stored)
    }

    async fn get(&self, id: u64) -> StorageResult<Option<UnifiedLead>> {
        let state = self.lock()?;
        Ok(state.leads.get(&id).cloned())
    }

    async fn update(&self, id: u64, patch: LeadPatch) -> StorageResult<Option<UnifiedLead>> {
        let mut state = self.lock()?;
        let Some(lead) = state.leads.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(expected) = patch.expected_version {
            if expected != lead.version {
                return Err(StorageError::VersionConflict {
                    id,
                    expected,
                    actual: lead.version,
                });
            }
        }

        patch.apply_to(lead);
        lead.updated_at = Some(Utc::now());
        lead.version += 1;

        debug!("Updated lead {} to version {}", id, lead.version);
        Ok(Some(lead.clone()))
    }

    async fn add_interaction(
        &self,
        interaction: NewInteraction,
    ) -> StorageResult<Option<(UnifiedLead, LeadInteraction)>> {
        let mut state = self.lock()?;
        if !state.leads.contains_key(&interaction.lead_id) {
            return Ok(None);
        }

        let interaction_id = state.next_interaction_id;
        state.next_interaction_id += 1;
        let now = Utc::now();

        let stored = LeadInteraction {
            id: interaction_id,
            lead_id: interaction.lead_id,
            kind: interaction.kind,
            content: interaction.content,
            status: interaction.status,
            created_at: now,
        };

        let lead = match state.leads.get_mut(&interaction.lead_id) {
            Some(lead) => {
                lead.status = Some(interaction.status);
                lead.updated_at = Some(now);
                lead.version += 1;
                lead.clone()
            }
            None => return Ok(None),
        };

        state
            .interactions
            .entry(interaction.lead_id)
            .or_default()
            .push(stored.clone());

        debug!(
            "Added {} interaction {} to lead {}",
            stored.kind, interaction_id, stored.lead_id
        );
        Ok(Some((lead, stored)))
    }

    async fn list_interactions(&self, lead_id: u64) -> StorageResult<Vec<LeadInteraction>> {
        let state = self.lock()?;
        let mut interactions = state.interactions.get(&lead_id).cloned().unwrap_or_default();
        interactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(interactions)
    }

    async fn list(&self) -> StorageResult<Vec<UnifiedLead>> {
        let state = self.lock()?;
        Ok(state.leads.values().cloned().collect())
    }

    async fn search(&self, query: &str) -> StorageResult<Vec<UnifiedLead>> {
        let needle = query.to_lowercase();
        let state = self.lock()?;
        let leads = state
            .leads
            .values()
            .filter(|lead| {
                lead.name.to_lowercase().contains(&needle)
                    || lead.source.as_str().contains(&needle)
                    || lead.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(leads)
    }

    async fn filter_by_status(&self, status: LeadStatus) -> StorageResult<Vec<UnifiedLead>> {
        let state = self.lock()?;
        Ok(state
            .leads
            .values()
            .filter(|lead| lead.status == Some(status))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: u64) -> StorageResult<bool> {
        let mut state = self.lock()?;
        state.interactions.remove(&id);
        let removed = state.leads.remove(&id).is_some();
        if removed {
            debug!("Deleted lead {}", id);
        }
        Ok(removed)
    }
}
