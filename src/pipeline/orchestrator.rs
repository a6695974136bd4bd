use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::app::lead_manager_use_case::{LeadAction, LeadManager};
use crate::domain::{LeadSource, LeadStatus};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::pipeline_config::{PipelineConfig, SourceSelection};
use crate::pipeline::processing::filter::LeadFilter;
use crate::pipeline::processing::normalize::NormalizationRegistry;
use crate::pipeline::processing::scoring::LeadScorer;

/// Raw scraped records keyed by source name, each list in scrape order
pub type SourceInput = HashMap<String, Vec<Value>>;

/// Cooperative cancellation, checked between sources
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Normalize,
    Persist,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Normalize => "normalize",
            FailureStage::Persist => "persist",
        }
    }
}

/// One record or lead that could not be carried through
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub stage: FailureStage,
    /// Position of the record in the source's input, for normalization failures
    pub index: Option<usize>,
    pub lead: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistedLead {
    pub id: u64,
    pub name: String,
    pub status: LeadStatus,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRunReport {
    pub source: LeadSource,
    pub received: usize,
    pub normalized: usize,
    pub filtered_out: usize,
    pub scored: usize,
    pub persisted: Vec<PersistedLead>,
    pub notifications_attempted: usize,
    pub notifications_failed: usize,
    pub failures: Vec<UnitFailure>,
}

impl SourceRunReport {
    fn new(source: LeadSource, received: usize) -> Self {
        Self {
            source,
            received,
            normalized: 0,
            filtered_out: 0,
            scored: 0,
            persisted: Vec::new(),
            notifications_attempted: 0,
            notifications_failed: 0,
            failures: Vec::new(),
        }
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when the run stopped before reaching every configured source
    pub cancelled: bool,
    /// Records received across all sources, including ones that failed to normalize
    pub total_processed: usize,
    pub total_normalized: usize,
    pub total_filtered: usize,
    pub persisted: usize,
    pub notifications_attempted: usize,
    pub notifications_failed: usize,
    /// Configured names that matched no supported source
    pub skipped_sources: Vec<String>,
    pub sources: Vec<SourceRunReport>,
}

impl PipelineRunReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            cancelled: false,
            total_processed: 0,
            total_normalized: 0,
            total_filtered: 0,
            persisted: 0,
            notifications_attempted: 0,
            notifications_failed: 0,
            skipped_sources: Vec::new(),
            sources: Vec::new(),
        }
    }

    fn add_source(&mut self, report: SourceRunReport) {
        self.total_processed += report.received;
        self.total_normalized += report.normalized;
        self.total_filtered += report.filtered_out;
        self.persisted += report.persisted.len();
        self.notifications_attempted += report.notifications_attempted;
        self.notifications_failed += report.notifications_failed;
        self.sources.push(report);
    }

    fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitFailure> {
        self.sources.iter().flat_map(|s| s.failures.iter())
    }
}

/// Runs normalize, filter, score and qualify over every configured source.
///
/// Sources run in configuration order and leads in arrival order. A failing record
/// or lead is recorded and the run moves on.
pub struct LeadGenerationPipeline {
    config: PipelineConfig,
    registry: NormalizationRegistry,
    filter: LeadFilter,
    scorer: Option<LeadScorer>,
    manager: Arc<LeadManager>,
}

impl LeadGenerationPipeline {
    pub fn new(config: PipelineConfig, manager: Arc<LeadManager>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: NormalizationRegistry::new(),
            filter: LeadFilter::new(config.filter.clone()),
            scorer: config.scorer.clone().map(LeadScorer::new),
            config,
            manager,
        })
    }

    pub fn with_registry(mut self, registry: NormalizationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[instrument(skip(self, input, cancel))]
    pub async fn run(&self, input: &SourceInput, cancel: &CancellationFlag) -> PipelineRunReport {
        let mut report = PipelineRunReport::new();
        info!(
            "🚀 Starting lead pipeline run {} over {} configured source(s)",
            report.run_id,
            self.config.sources.len()
        );

        let configured: HashSet<String> =
            self.config.sources.iter().map(|s| s.trim().to_lowercase()).collect();
        for name in input.keys() {
            if !configured.contains(&name.trim().to_lowercase()) {
                warn!("⚠️ Input for source '{}' ignored: not in the configured sources", name);
            }
        }

        let mut seen = HashSet::new();
        for (name, selection) in self.config.sources.iter().zip(self.config.source_selection()) {
            if cancel.is_cancelled() {
                warn!("⏹️ Run {} cancelled before source '{}'", report.run_id, name);
                report.cancelled = true;
                break;
            }

            let source = match selection {
                SourceSelection::Supported(source) => source,
                SourceSelection::Unknown(name) => {
                    warn!("⚠️ Skipping unknown source '{}'", name);
                    metrics::pipeline::source_skipped(&name);
                    report.skipped_sources.push(name);
                    continue;
                }
            };
            if !seen.insert(source) {
                warn!("⚠️ Source '{}' listed more than once; running it once", source);
                continue;
            }

            let records = Self::records_for(input, source);
            let source_report = self.run_source(source, records).await;
            info!(
                "✅ Source {}: {} received, {} filtered out, {} persisted, {} failure(s)",
                source,
                source_report.received,
                source_report.filtered_out,
                source_report.persisted.len(),
                source_report.failures.len()
            );
            report.add_source(source_report);
        }

        report.complete();
        let duration_secs = report
            .duration()
            .and_then(|d| d.to_std().ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        metrics::pipeline::run_completed(duration_secs, report.cancelled);

        info!(
            "🎉 Run {} finished: {} processed, {} filtered, {} persisted, {} notified",
            report.run_id,
            report.total_processed,
            report.total_filtered,
            report.persisted,
            report.notifications_attempted
        );
        report
    }

    fn records_for(input: &SourceInput, source: LeadSource) -> &[Value] {
        input
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(source.as_str()))
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    async fn run_source(&self, source: LeadSource, records: &[Value]) -> SourceRunReport {
        let mut report = SourceRunReport::new(source, records.len());

        let mut normalized = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match self.registry.normalize_value(source, record.clone()) {
                Ok(lead) => normalized.push(lead),
                Err(e) => {
                    warn!("⚠️ Failed to normalize {} record {}: {}", source, index, e);
                    metrics::pipeline::unit_failed(
                        source.as_str(),
                        FailureStage::Normalize.as_str(),
                    );
                    report.failures.push(UnitFailure {
                        stage: FailureStage::Normalize,
                        index: Some(index),
                        lead: record.get("name").and_then(|v| v.as_str()).map(str::to_string),
                        error: e.to_string(),
                    });
                }
            }
        }
        report.normalized = normalized.len();

        let outcome = self.filter.filter(&normalized);
        report.filtered_out = outcome.rejected_count;

        for lead in outcome.retained {
            let name = lead.name.clone();
            let (action, score) = match &self.scorer {
                Some(scorer) => {
                    let scored = scorer.score(&lead);
                    report.scored += 1;
                    let action = match scored.lead.status.filter(|_| scored.auto_qualified) {
                        Some(status) => LeadAction::create_promoted(lead, status),
                        None => LeadAction::create(lead),
                    };
                    (action, Some(scored.total_score))
                }
                None => (LeadAction::create(lead), None),
            };

            match self.manager.execute(action).await {
                Ok(result) => {
                    let failed = result.notifications.iter().filter(|n| !n.success).count();
                    report.notifications_attempted += result.notifications.len();
                    report.notifications_failed += failed;
                    debug!("Lead {} persisted with status {}", name, result.status);
                    report.persisted.push(PersistedLead {
                        id: result.lead.id.unwrap_or_default(),
                        name,
                        status: result.status,
                        score,
                    });
                }
                Err(e) => {
                    warn!("⚠️ Failed to persist {} lead {}: {}", source, name, e);
                    metrics::pipeline::unit_failed(source.as_str(), FailureStage::Persist.as_str());
                    report.failures.push(UnitFailure {
                        stage: FailureStage::Persist,
                        index: None,
                        lead: Some(name),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
