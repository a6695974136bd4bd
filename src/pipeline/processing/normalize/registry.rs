use serde_json::Value;
use std::collections::HashMap;

use super::normalizers::{
    GoDaddyNormalizer, MetricsNormalizer, OpenSeaNormalizer, SedoNormalizer, SourceNormalizer,
};
use super::RawSourceRecord;
use crate::domain::{LeadSource, UnifiedLead};
use crate::error::{ProspectorError, Result};

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<LeadSource, Box<dyn SourceNormalizer>>,
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the built-in normalizers
    pub fn new() -> Self {
        let mut normalizers: HashMap<LeadSource, Box<dyn SourceNormalizer>> = HashMap::new();

        normalizers.insert(
            LeadSource::Sedo,
            Box::new(MetricsNormalizer::new(SedoNormalizer::new())),
        );
        normalizers.insert(
            LeadSource::OpenSea,
            Box::new(MetricsNormalizer::new(OpenSeaNormalizer::new())),
        );
        normalizers.insert(
            LeadSource::GoDaddy,
            Box::new(MetricsNormalizer::new(GoDaddyNormalizer::new())),
        );

        Self { normalizers }
    }

    /// Register a normalizer, replacing any existing one for its source
    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.source(), normalizer);
    }

    pub fn get_normalizer(&self, source: LeadSource) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&source).map(|n| n.as_ref())
    }

    /// Normalize a record using the normalizer registered for its tag
    pub fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead> {
        let source = record.source();
        match self.get_normalizer(source) {
            Some(normalizer) => normalizer.normalize(record),
            None => Err(ProspectorError::UnknownSource(source.to_string())),
        }
    }

    /// Decode and normalize one untyped listing scraped from `source`
    pub fn normalize_value(&self, source: LeadSource, value: Value) -> Result<UnifiedLead> {
        let record = RawSourceRecord::from_value(source, value)?;
        self.normalize(&record)
    }

    pub fn list_sources(&self) -> Vec<LeadSource> {
        let mut sources: Vec<LeadSource> = self.normalizers.keys().copied().collect();
        sources.sort_by_key(|s| s.as_str());
        sources
    }
}
