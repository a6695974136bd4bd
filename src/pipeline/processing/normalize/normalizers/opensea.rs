use super::base::{NormalizerUtils, SourceNormalizer};
use crate::constants;
use crate::domain::{LastSale, LeadMetadata, LeadSource, Seller, SourceDetails, Trait, UnifiedLead};
use crate::error::Result;
use crate::pipeline::processing::normalize::RawSourceRecord;

/// Normalizer for OpenSea on-chain name listings.
///
/// OpenSea has no category field; it comes from the `Category` trait when present.
#[derive(Default)]
pub struct OpenSeaNormalizer;

impl OpenSeaNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl SourceNormalizer for OpenSeaNormalizer {
    fn normalize(&self, record: &RawSourceRecord) -> Result<UnifiedLead> {
        let RawSourceRecord::OpenSea(listing) = record else {
            return Err(NormalizerUtils::mismatch(self.source(), record));
        };

        let category_trait = listing
            .traits
            .iter()
            .find(|t| t.name == constants::OPENSEA_CATEGORY_TRAIT)
            .map(|t| t.value.as_str());

        let address = NormalizerUtils::non_blank(listing.seller.address.as_deref());
        let username = NormalizerUtils::non_blank(listing.seller.username.as_deref());
        let display_name = username.clone().or_else(|| address.clone()).unwrap_or_default();

        let mut lead = UnifiedLead::new(
            LeadSource::OpenSea,
            listing.name.trim(),
            listing.price.clone(),
            NormalizerUtils::category_or_default(category_trait),
        );
        lead.seller = Seller {
            name: display_name,
            email: None,
            address,
            username,
            portfolio_size: listing.seller.portfolio_size,
        };
        lead.metadata = LeadMetadata {
            source: SourceDetails {
                chain: listing.chain.clone(),
                traits: listing
                    .traits
                    .iter()
                    .map(|t| Trait {
                        name: t.name.clone(),
                        value: t.value.clone(),
                    })
                    .collect(),
                last_sale: listing.last_sale.as_ref().map(|sale| LastSale {
                    price: sale.price.clone(),
                    date: sale.date.clone(),
                }),
                ..Default::default()
            },
            signals: listing.signals.clone(),
        };
        Ok(lead)
    }

    fn source(&self) -> LeadSource {
        LeadSource::OpenSea
    }

    fn name(&self) -> &str {
        "OpenSea"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: serde_json::Value) -> UnifiedLead {
        let record = RawSourceRecord::from_value(LeadSource::OpenSea, value).unwrap();
        OpenSeaNormalizer::new().normalize(&record).unwrap()
    }

    #[test]
    fn test_category_comes_from_trait() {
        let lead = normalize(json!({
            "name": "web3domain.eth",
            "price": "0.5 ETH",
            "chain": "ethereum",
            "seller": { "address": "0x1234", "username": "cryptoking", "portfolioSize": 25 },
            "traits": [
                { "name": "Length", "value": "10" },
                { "name": "Category", "value": "Web3" }
            ],
            "lastSale": { "price": "0.3 ETH", "date": "2024-01-15" }
        }));

        assert_eq!(lead.category, "Web3");
        assert_eq!(lead.seller.name, "cryptoking");
        assert_eq!(lead.seller.address.as_deref(), Some("0x1234"));
        assert_eq!(lead.metadata.source.chain.as_deref(), Some("ethereum"));
        assert_eq!(lead.metadata.source.traits.len(), 2);
        assert_eq!(lead.metadata.source.last_sale.as_ref().unwrap().price, "0.3 ETH");
        assert!(lead.traffic.is_none());
    }

    #[test]
    fn test_missing_category_trait_defaults() {
        let lead = normalize(json!({
            "name": "vault.eth",
            "price": "1 ETH",
            "seller": { "address": "0xabcd", "username": "" },
            "traits": [{ "name": "Length", "value": 5 }]
        }));

        assert_eq!(lead.category, "Uncategorized");
        assert_eq!(lead.seller.name, "0xabcd");
        assert!(lead.seller.username.is_none());
        assert_eq!(lead.metadata.source.traits[0].value, "5");
    }
}
