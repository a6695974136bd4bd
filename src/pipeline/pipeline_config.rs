use serde::{Deserialize, Serialize};

use crate::app::lead_manager_use_case::LeadManagementConfig;
use crate::constants;
use crate::domain::LeadSource;
use crate::error::{ProspectorError, Result};
use crate::pipeline::processing::filter::FilterConfig;
use crate::pipeline::processing::scoring::ScorerConfig;

/// Everything a pipeline run needs, passed in explicitly per run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source names in processing order
    pub sources: Vec<String>,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Scoring is skipped when absent
    #[serde(default)]
    pub scorer: Option<ScorerConfig>,
    #[serde(default)]
    pub manager: LeadManagementConfig,
}

/// A configured source name, resolved or not
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSelection {
    Supported(LeadSource),
    Unknown(String),
}

impl PipelineConfig {
    /// Every supported source, no filtering, no scoring
    pub fn all_sources() -> Self {
        Self {
            sources: constants::get_supported_sources()
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve configured names in order; unknown names are kept so they can be reported
    pub fn source_selection(&self) -> Vec<SourceSelection> {
        self.sources
            .iter()
            .map(|name| match name.parse::<LeadSource>() {
                Ok(source) => SourceSelection::Supported(source),
                Err(_) => SourceSelection::Unknown(name.clone()),
            })
            .collect()
    }

    /// Reject configurations whose numbers cannot produce meaningful results
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.filter.min_price, self.filter.max_price) {
            if min > max {
                return Err(ProspectorError::Config(format!(
                    "filter min_price {} exceeds max_price {}",
                    min, max
                )));
            }
        }

        if let Some(scorer) = &self.scorer {
            scorer.criteria.validate()?;
            if let Some(rule) = &scorer.auto_qualify {
                if !(0.0..=1.0).contains(&rule.min_score) {
                    return Err(ProspectorError::Config(format!(
                        "scoring auto_qualify min_score {} is outside [0, 1]",
                        rule.min_score
                    )));
                }
            }
        }

        if let Some(rule) = &self.manager.auto_qualify {
            if let (Some(min), Some(max)) = (rule.min_price, rule.max_price) {
                if min > max {
                    return Err(ProspectorError::Config(format!(
                        "manager auto_qualify min_price {} exceeds max_price {}",
                        min, max
                    )));
                }
            }
        }

        Ok(())
    }
}
