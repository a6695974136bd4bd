//! Metrics for the lead pipeline
//!
//! Recording goes through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use tracing::info;

use crate::error::{ProspectorError, Result};

/// Every metric name recorded by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Normalize metrics
    NormalizeRecordsProcessed,
    NormalizeRecordsFailed,
    NormalizeCategoryDefaulted,

    // Filter metrics
    FilterLeadsRejected,
    FilterLeadsRetained,

    // Scoring metrics
    ScoringLeadsScored,
    ScoringTotalScore,
    ScoringAutoQualified,

    // Qualify metrics
    QualifyLeadsCreated,
    QualifyLeadsUpdated,
    QualifyInteractionsAdded,

    // Notification metrics
    NotificationsSent,
    NotificationsFailed,

    // Pipeline metrics
    PipelineRunsCompleted,
    PipelineRunsCancelled,
    PipelineSourcesSkipped,
    PipelineUnitFailures,
    PipelineRunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeRecordsProcessed => "prospector_normalize_records_processed_total",
            MetricName::NormalizeRecordsFailed => "prospector_normalize_records_failed_total",
            MetricName::NormalizeCategoryDefaulted => {
                "prospector_normalize_category_defaulted_total"
            }

            MetricName::FilterLeadsRejected => "prospector_filter_leads_rejected_total",
            MetricName::FilterLeadsRetained => "prospector_filter_leads_retained_total",

            MetricName::ScoringLeadsScored => "prospector_scoring_leads_scored_total",
            MetricName::ScoringTotalScore => "prospector_scoring_total_score",
            MetricName::ScoringAutoQualified => "prospector_scoring_auto_qualified_total",

            MetricName::QualifyLeadsCreated => "prospector_qualify_leads_created_total",
            MetricName::QualifyLeadsUpdated => "prospector_qualify_leads_updated_total",
            MetricName::QualifyInteractionsAdded => "prospector_qualify_interactions_added_total",

            MetricName::NotificationsSent => "prospector_notifications_sent_total",
            MetricName::NotificationsFailed => "prospector_notifications_failed_total",

            MetricName::PipelineRunsCompleted => "prospector_pipeline_runs_completed_total",
            MetricName::PipelineRunsCancelled => "prospector_pipeline_runs_cancelled_total",
            MetricName::PipelineSourcesSkipped => "prospector_pipeline_sources_skipped_total",
            MetricName::PipelineUnitFailures => "prospector_pipeline_unit_failures_total",
            MetricName::PipelineRunDuration => "prospector_pipeline_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder with an HTTP scrape endpoint on `port`.
///
/// Must be called from inside a tokio runtime.
pub fn init(port: u16) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            ProspectorError::Config(format!("Failed to install Prometheus exporter: {}", e))
        })?;

    info!("📈 Metrics exporter listening on {}", addr);
    Ok(())
}

// Phase-specific metrics functions

/// Source normalization
pub mod normalize {
    use super::MetricName;

    pub fn record_normalized(source: &str) {
        ::metrics::counter!(
            MetricName::NormalizeRecordsProcessed.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }

    pub fn record_failed(source: &str) {
        ::metrics::counter!(
            MetricName::NormalizeRecordsFailed.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }

    pub fn category_defaulted(source: &str) {
        ::metrics::counter!(
            MetricName::NormalizeCategoryDefaulted.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }
}

/// Lead filter
pub mod filter {
    use super::MetricName;

    pub fn lead_rejected(reason: &str) {
        ::metrics::counter!(
            MetricName::FilterLeadsRejected.as_str(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    pub fn leads_retained(count: usize) {
        ::metrics::counter!(MetricName::FilterLeadsRetained.as_str()).increment(count as u64);
    }
}

/// Lead scorer
pub mod scoring {
    use super::MetricName;

    pub fn lead_scored(total_score: f64) {
        ::metrics::counter!(MetricName::ScoringLeadsScored.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ScoringTotalScore.as_str()).record(total_score);
    }

    pub fn lead_auto_qualified(status: &str) {
        ::metrics::counter!(
            MetricName::ScoringAutoQualified.as_str(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

/// Lead manager transitions
pub mod qualify {
    use super::MetricName;

    pub fn lead_created(status: &str) {
        ::metrics::counter!(
            MetricName::QualifyLeadsCreated.as_str(),
            "status" => status.to_string()
        )
        .increment(1);
    }

    pub fn lead_updated(status: &str) {
        ::metrics::counter!(
            MetricName::QualifyLeadsUpdated.as_str(),
            "status" => status.to_string()
        )
        .increment(1);
    }

    pub fn interaction_added(status: &str) {
        ::metrics::counter!(
            MetricName::QualifyInteractionsAdded.as_str(),
            "status" => status.to_string()
        )
        .increment(1);
    }
}

pub mod notifications {
    use super::MetricName;

    pub fn notification_sent(channel: &str, kind: &str, success: bool) {
        let name = if success {
            MetricName::NotificationsSent
        } else {
            MetricName::NotificationsFailed
        };
        ::metrics::counter!(
            name.as_str(),
            "channel" => channel.to_string(),
            "type" => kind.to_string()
        )
        .increment(1);
    }
}

/// Orchestrator runs
pub mod pipeline {
    use super::MetricName;

    pub fn run_completed(duration_secs: f64, cancelled: bool) {
        if cancelled {
            ::metrics::counter!(MetricName::PipelineRunsCancelled.as_str()).increment(1);
        } else {
            ::metrics::counter!(MetricName::PipelineRunsCompleted.as_str()).increment(1);
        }
        ::metrics::histogram!(MetricName::PipelineRunDuration.as_str()).record(duration_secs);
    }

    pub fn source_skipped(source: &str) {
        ::metrics::counter!(
            MetricName::PipelineSourcesSkipped.as_str(),
            "source" => source.to_string()
        )
        .increment(1);
    }

    pub fn unit_failed(source: &str, stage: &str) {
        ::metrics::counter!(
            MetricName::PipelineUnitFailures.as_str(),
            "source" => source.to_string(),
            "stage" => stage.to_string()
        )
        .increment(1);
    }
}
