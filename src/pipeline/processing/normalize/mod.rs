use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{LeadSource, ScoringSignals};
use crate::error::{ProspectorError, Result};

pub mod normalizers;
pub mod registry;

pub use registry::NormalizationRegistry;

/// Seller block shared by the Sedo and GoDaddy listing shapes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceSeller {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub portfolio_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSeller {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub portfolio_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrait {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLastSale {
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SedoListing {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub traffic: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub seller: MarketplaceSeller,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub signals: ScoringSignals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSeaListing {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub chain: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub seller: WalletSeller,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub traits: Vec<RawTrait>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub last_sale: Option<RawLastSale>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub signals: ScoringSignals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoDaddyListing {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub traffic: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub seller: MarketplaceSeller,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub auction_end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub bids: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub reserve_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub signals: ScoringSignals,
}

/// One scraped listing, tagged with the marketplace it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RawSourceRecord {
    Sedo(SedoListing),
    OpenSea(OpenSeaListing),
    GoDaddy(GoDaddyListing),
}

impl RawSourceRecord {
    /// Decode an untagged listing scraped from `source`.
    ///
    /// Optional fields decode as absent. A missing or blank `name` is rejected.
    pub fn from_value(source: LeadSource, value: Value) -> Result<Self> {
        let record = match source {
            LeadSource::Sedo => RawSourceRecord::Sedo(serde_json::from_value(value)?),
            LeadSource::OpenSea => RawSourceRecord::OpenSea(serde_json::from_value(value)?),
            LeadSource::GoDaddy => RawSourceRecord::GoDaddy(serde_json::from_value(value)?),
        };

        if record.name().trim().is_empty() {
            return Err(ProspectorError::MissingField("name".to_string()));
        }
        Ok(record)
    }

    pub fn source(&self) -> LeadSource {
        match self {
            RawSourceRecord::Sedo(_) => LeadSource::Sedo,
            RawSourceRecord::OpenSea(_) => LeadSource::OpenSea,
            RawSourceRecord::GoDaddy(_) => LeadSource::GoDaddy,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RawSourceRecord::Sedo(listing) => &listing.name,
            RawSourceRecord::OpenSea(listing) => &listing.name,
            RawSourceRecord::GoDaddy(listing) => &listing.name,
        }
    }
}

/// Accepts a string, a number or null; scrapers are inconsistent about prices
fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Counts may arrive as numbers or numeric strings; anything else is absent
fn lenient_opt_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

/// Nested blocks that are null or of the wrong shape decode as their default
fn lenient_or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_decodes_numeric_price() {
        let record = RawSourceRecord::from_value(
            LeadSource::Sedo,
            json!({ "name": "example.com", "price": 1500, "traffic": 2000 }),
        )
        .unwrap();

        match record {
            RawSourceRecord::Sedo(listing) => {
                assert_eq!(listing.price, "1500");
                assert_eq!(listing.traffic.as_deref(), Some("2000"));
                assert!(listing.seller.portfolio_size.is_none());
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_from_value_rejects_blank_name() {
        let value = json!({ "name": "  ", "price": "$10" });
        let err = RawSourceRecord::from_value(LeadSource::GoDaddy, value).unwrap_err();
        assert!(matches!(err, ProspectorError::MissingField(ref f) if f == "name"));

        let value = json!({ "price": "1 ETH" });
        let err = RawSourceRecord::from_value(LeadSource::OpenSea, value).unwrap_err();
        assert!(matches!(err, ProspectorError::MissingField(_)));
    }

    #[test]
    fn test_from_value_reads_camel_case_fields() {
        let record = RawSourceRecord::from_value(
            LeadSource::GoDaddy,
            json!({
                "name": "auction.io",
                "price": "$2,000",
                "seller": { "name": "Broker", "portfolioSize": 40 },
                "auctionEndDate": "2024-03-01T00:00:00Z",
                "bids": 7,
                "reservePrice": "$1,500",
                "signals": { "priceNegotiable": true, "sellerRating": 4.9 }
            }),
        )
        .unwrap();

        let RawSourceRecord::GoDaddy(listing) = record else {
            panic!("expected a GoDaddy listing");
        };
        assert_eq!(listing.seller.portfolio_size, Some(40));
        assert_eq!(listing.bids, Some(7));
        assert_eq!(listing.reserve_price.as_deref(), Some("$1,500"));
        assert_eq!(listing.signals.price_negotiable, Some(true));
        assert_eq!(listing.signals.seller_rating, Some(4.9));
    }

    #[test]
    fn test_tagged_form_round_trips() {
        let value = json!({ "source": "opensea", "name": "vault.eth", "price": "0.5 ETH" });
        let record: RawSourceRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.source(), LeadSource::OpenSea);
        assert_eq!(record.name(), "vault.eth");
    }

    #[test]
    fn test_null_seller_decodes_as_empty() {
        let record = RawSourceRecord::from_value(
            LeadSource::Sedo,
            json!({ "name": "a.com", "seller": null }),
        )
        .unwrap();
        let RawSourceRecord::Sedo(listing) = record else {
            panic!("expected a Sedo listing");
        };
        assert!(listing.seller.name.is_none());
        assert!(listing.seller.portfolio_size.is_none());
    }

    #[test]
    fn test_numeric_string_counts_are_accepted() {
        let record = RawSourceRecord::from_value(
            LeadSource::GoDaddy,
            json!({
                "name": "b.io",
                "seller": { "name": 42, "portfolioSize": "25" },
                "bids": "3"
            }),
        )
        .unwrap();
        let RawSourceRecord::GoDaddy(listing) = record else {
            panic!("expected a GoDaddy listing");
        };
        assert_eq!(listing.seller.portfolio_size, Some(25));
        assert_eq!(listing.seller.name.as_deref(), Some("42"));
        assert_eq!(listing.bids, Some(3));
    }

    #[test]
    fn test_unusable_counts_become_absent() {
        let record = RawSourceRecord::from_value(
            LeadSource::GoDaddy,
            json!({ "name": "c.io", "seller": { "portfolioSize": "lots" }, "bids": -2 }),
        )
        .unwrap();
        let RawSourceRecord::GoDaddy(listing) = record else {
            panic!("expected a GoDaddy listing");
        };
        assert!(listing.seller.portfolio_size.is_none());
        assert!(listing.bids.is_none());
    }

    #[test]
    fn test_malformed_opensea_blocks_keep_the_record() {
        let record = RawSourceRecord::from_value(
            LeadSource::OpenSea,
            json!({
                "name": "d.eth",
                "traits": null,
                "seller": "0xabc",
                "lastSale": 5,
                "signals": []
            }),
        )
        .unwrap();
        let RawSourceRecord::OpenSea(listing) = record else {
            panic!("expected an OpenSea listing");
        };
        assert!(listing.traits.is_empty());
        assert!(listing.seller.address.is_none());
        assert!(listing.last_sale.is_none());
        assert!(listing.signals.market_demand.is_none());
    }
}
