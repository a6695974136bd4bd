use super::base::{NormalizerUtils, SourceNormalizer};
use crate::domain::{LeadMetadata, LeadSource, Seller, SourceDetails, UnifiedLead};
use crate::error::Result;
use crate::pipeline::processing::normalize::RawSourceRecord;

/// Normalizer for GoDaddy auction listings
#[derive(Default)]
pub struct GoDaddyNormalizer;

impl GoDaddyNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl SourceNormalizer for GoDaddyNormalizer {
    fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead> {
        let RawSourceRecord::GoDaddy(listing) = record else {
            return Err(NormalizerUtils::mismatch(self.source(), record));
        };

        let mut lead = UnifiedLead::new(
            LeadSource::GoDaddy,
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
            source: SourceDetails {
                auction_end_date: listing.auction_end_date.clone(),
                bids: listing.bids,
                reserve_price: listing.reserve_price.clone(),
                ..Default::default()
            },
            signals: listing.signals.clone(),
        };
        Ok(lead)
    }

    fn source(&self) -> LeadSource {
        LeadSource::GoDaddy
    }

    fn name(&self) -> &str {
        "GoDaddy Auctions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auction_fields_carried_into_metadata() {
        let record = RawSourceRecord::from_value(
            LeadSource::GoDaddy,
            json!({
                "name": "premium.com",
                "price": "$10,000",
                "category": "Business",
                "traffic": "5000",
                "seller": {
                    "name": "Jane Smith",
                    "email": "jane@example.com",
                    "portfolioSize": 100
                },
                "auctionEndDate": "2024-12-31",
                "bids": 5,
                "reservePrice": "$8,000"
            }),
        )
        .unwrap();

        let lead = GoDaddyNormalizer::new().normalize(&record).unwrap();
        assert_eq!(lead.source, LeadSource::GoDaddy);
        assert_eq!(lead.category, "Business");
        assert_eq!(lead.metadata.source.auction_end_date.as_deref(), Some("2024-12-31"));
        assert_eq!(lead.metadata.source.bids, Some(5));
        assert_eq!(lead.metadata.source.reserve_price.as_deref(), Some("$8,000"));
        assert_eq!(lead.seller.portfolio_size, Some(100));
    }

    #[test]
    fn test_auction_without_bids_leaves_them_absent() {
        let record = RawSourceRecord::from_value(
            LeadSource::GoDaddy,
            json!({ "name": "quiet.org", "price": "$100", "category": "" }),
        )
        .unwrap();
        let lead = GoDaddyNormalizer::new().normalize(&record).unwrap();
        assert!(lead.metadata.source.bids.is_none());
        assert!(lead.metadata.source.auction_end_date.is_none());
        assert_eq!(lead.category, "Uncategorized");
    }
}
