use super::base::{NormalizerUtils, SourceNormalizer};
use crate::domain::{LeadMetadata, LeadSource, Seller, SourceDetails, UnifiedLead};
use crate::error::Result;
use crate::pipeline::processing::normalize::RawSourceRecord;

/// Normalizer for Sedo marketplace listings
#[derive(Default)]
pub struct SedoNormalizer;

impl SedoNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl SourceNormalizer for SedoNormalizer {
    fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead> {
        let RawSourceRecord::Sedo(listing) = record else {
            return Err(NormalizerUtils::mismatch(self.source(), record));
        };

        let mut lead = UnifiedLead::new(
            LeadSource::Sedo,
            listing.name.trim(),
            listing.price.clone(),
            NormalizerUtils::category_or_default(listing.category.as_deref()),
        );
        lead.traffic = listing.traffic.clone();
        lead.seller = Seller {
            name: listing.seller.name.clone().unwrap_or_default(),
            email: NormalizerUtils::non_blank(listing.seller.email.as_deref()),
            address: None,
            username: None,
            portfolio_size: listing.seller.portfolio_size,
        };
        lead.metadata = LeadMetadata {
            source: SourceDetails::default(),
            signals: listing.signals.clone(),
        };
        Ok(lead)
    }

    fn source(&self) -> LeadSource {
        LeadSource::Sedo
    }

    fn name(&self) -> &str {
        "Sedo"
    }
}
