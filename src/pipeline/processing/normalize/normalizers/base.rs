use crate::constants;
use crate::domain::{LeadSource, UnifiedLead};
use crate::error::{ProspectorError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::normalize::RawSourceRecord;

/// Base trait for source-specific normalizers
pub trait SourceNormalizer: Send + Sync {
    /// Map one raw listing to exactly one unified lead
    fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead>;

    /// The source this normalizer handles
    fn source(&self) -> LeadSource;

    /// Human-readable name for this normalizer
    fn name(&self) -> &str;
}

/// A wrapper that adds metrics to any normalizer implementation
pub struct MetricsNormalizer<N: SourceNormalizer> {
    inner: N,
}

impl<N: SourceNormalizer> MetricsNormalizer<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

impl<N: SourceNormalizer> SourceNormalizer for MetricsNormalizer<N> {
    fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead> {
        let source = self.inner.source().as_str();
        match self.inner.normalize(record) {
            Ok(lead) => {
                metrics::normalize::record_normalized(source);
                if lead.category == constants::UNCATEGORIZED {
                    metrics::normalize::category_defaulted(source);
                }
                Ok(lead)
            }
            Err(e) => {
                metrics::normalize::record_failed(source);
                Err(e)
            }
        }
    }

    fn source(&self) -> LeadSource {
        self.inner.source()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Shared utilities for normalizers
pub struct NormalizerUtils;

impl NormalizerUtils {
    /// Trimmed category, or the uncategorized placeholder when blank or missing
    pub fn category_or_default(category: Option<&str>) -> String {
        category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(constants::UNCATEGORIZED)
            .to_string()
    }

    /// `Some` only for strings with visible content
    pub fn non_blank(value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn mismatch(expected: LeadSource, record: &RawSourceRecord) -> ProspectorError {
        ProspectorError::UnknownSource(format!(
            "{} normalizer received a {} record",
            expected,
            record.source()
        ))
    }
}
