use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants;
use crate::error::ProspectorError;

/// Marketplace a lead was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Sedo,
    OpenSea,
    GoDaddy,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Sedo => constants::SEDO_SOURCE,
            LeadSource::OpenSea => constants::OPENSEA_SOURCE,
            LeadSource::GoDaddy => constants::GODADDY_SOURCE,
        }
    }

    pub fn all() -> [LeadSource; 3] {
        [LeadSource::Sedo, LeadSource::OpenSea, LeadSource::GoDaddy]
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = ProspectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            constants::SEDO_SOURCE => Ok(LeadSource::Sedo),
            constants::OPENSEA_SOURCE => Ok(LeadSource::OpenSea),
            constants::GODADDY_SOURCE => Ok(LeadSource::GoDaddy),
            other => Err(ProspectorError::UnknownSource(other.to_string())),
        }
    }
}

/// Pipeline lifecycle state of a lead.
///
/// `Closed` and `Rejected` are conventionally terminal; nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Negotiating,
    Closed,
    Rejected,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Negotiating => "negotiating",
            LeadStatus::Closed => "closed",
            LeadStatus::Rejected => "rejected",
        }
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = ProspectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "negotiating" => Ok(LeadStatus::Negotiating),
            "closed" => Ok(LeadStatus::Closed),
            "rejected" => Ok(LeadStatus::Rejected),
            other => Err(ProspectorError::Config(format!("unknown lead status '{}'", other))),
        }
    }
}

/// Coarser status vocabulary shown on the dashboard.
///
/// Deliberately has no conversion to or from [`LeadStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DashboardStatus {
    New,
    Contacted,
    Interested,
    #[serde(rename = "Not Interested")]
    NotInterested,
    Converted,
}

impl DashboardStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DashboardStatus::New => "New",
            DashboardStatus::Contacted => "Contacted",
            DashboardStatus::Interested => "Interested",
            DashboardStatus::NotInterested => "Not Interested",
            DashboardStatus::Converted => "Converted",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, alias = "portfolioSize", skip_serializing_if = "Option::is_none")]
    pub portfolio_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastSale {
    pub price: String,
    pub date: String,
}

/// Marketplace-specific extras carried over from the raw listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<Trait>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sale: Option<LastSale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_price: Option<String>,
}

/// Hints consumed by the scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSignals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_negotiable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_growing: Option<bool>,
    /// Hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_response_time: Option<f64>,
    /// 0 to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_rating: Option<f64>,
    /// 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_demand: Option<f64>,
    /// 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_competition: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadMetadata {
    #[serde(default)]
    pub source: SourceDetails,
    #[serde(default)]
    pub signals: ScoringSignals,
}

/// The canonical lead record every source is normalized into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedLead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub source: LeadSource,
    pub name: String,
    pub price: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<String>,
    pub seller: Seller,
    #[serde(default)]
    pub metadata: LeadMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Write counter maintained by the store; 0 until persisted.
    #[serde(default)]
    pub version: u64,
}

impl UnifiedLead {
    pub fn new(
        source: LeadSource,
        name: impl Into<String>,
        price: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source,
            name: name.into(),
            price: price.into(),
            category: category.into(),
            traffic: None,
            seller: Seller::default(),
            metadata: LeadMetadata::default(),
            status: None,
            created_at: None,
            updated_at: None,
            version: 0,
        }
    }

    pub fn numeric_price(&self) -> f64 {
        parse_price(&self.price)
    }

    pub fn numeric_traffic(&self) -> f64 {
        self.traffic.as_deref().map(parse_traffic).unwrap_or(0.0)
    }

    /// Portfolio size with absence counted as zero
    pub fn portfolio_size_or_zero(&self) -> u32 {
        self.seller.portfolio_size.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Email,
    Call,
    Meeting,
    Note,
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionType::Email => "email",
            InteractionType::Call => "call",
            InteractionType::Meeting => "meeting",
            InteractionType::Note => "note",
        };
        f.write_str(s)
    }
}

/// An interaction as submitted by a caller, before it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub lead_id: u64,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub content: String,
    /// Status the lead moves to once this interaction is recorded
    pub status: LeadStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInteraction {
    pub id: u64,
    pub lead_id: u64,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub content: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

static NON_PRICE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.]").expect("valid regex"));
static LEADING_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]*\.?[0-9]*").expect("valid regex"));

/// Numeric value of a free-text price.
///
/// Everything except digits and dots is stripped, then the leading decimal group is read.
/// Unparsable input is 0. Currencies are not distinguished: "$500" and "500 ETH" both give 500.
pub fn parse_price(raw: &str) -> f64 {
    let stripped = NON_PRICE_CHARS.replace_all(raw, "");
    LEADING_DECIMAL
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Numeric value of a free-text traffic figure; only digits are kept, unparsable input is 0.
pub fn parse_traffic(raw: &str) -> f64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().unwrap_or(0.0)
}
