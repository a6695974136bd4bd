use serde::{Deserialize, Serialize};

use crate::error::{ProspectorError, Result};

/// Criterion satisfied when a numeric attribute falls inside an inclusive range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCriterion {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub weight: f64,
}

impl RangeCriterion {
    pub fn new(min: f64, max: f64, weight: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            weight,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Criterion checked against a list of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCriterion {
    #[serde(default, alias = "preferred", alias = "keywords", alias = "excluded")]
    pub values: Vec<String>,
    pub weight: f64,
}

impl ListCriterion {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>, weight: f64) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            weight,
        }
    }
}

/// Criterion whose condition is fixed; only the weight is configurable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCriterion {
    pub weight: f64,
}

impl WeightedCriterion {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

/// The six buckets a lead score is split into, in recommendation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreCategory {
    Domain,
    Price,
    Traffic,
    Seller,
    Category,
    Market,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 6] = [
        ScoreCategory::Domain,
        ScoreCategory::Price,
        ScoreCategory::Traffic,
        ScoreCategory::Seller,
        ScoreCategory::Category,
        ScoreCategory::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Domain => "domain",
            ScoreCategory::Price => "price",
            ScoreCategory::Traffic => "traffic",
            ScoreCategory::Seller => "seller",
            ScoreCategory::Category => "category",
            ScoreCategory::Market => "market",
        }
    }

    /// Advice emitted when this bucket scores below one half
    pub fn recommendation(&self) -> &'static str {
        match self {
            ScoreCategory::Domain => "Consider domain name optimization for better marketability",
            ScoreCategory::Price => "Price may be outside optimal range for this market",
            ScoreCategory::Traffic => "Traffic levels may need improvement for better ROI",
            ScoreCategory::Seller => "Seller profile may indicate slower response times",
            ScoreCategory::Category => "Category may not align with target market",
            ScoreCategory::Market => "Market conditions may not be optimal for this domain",
        }
    }
}

/// Anything carrying a criterion weight
trait HasWeight {
    fn weight(&self) -> f64;
}

impl HasWeight for RangeCriterion {
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl HasWeight for ListCriterion {
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl HasWeight for WeightedCriterion {
    fn weight(&self) -> f64 {
        self.weight
    }
}

fn weight_of<C: HasWeight>(criterion: &Option<C>) -> Option<f64> {
    criterion.as_ref().map(HasWeight::weight)
}

/// Every optional criterion the scorer understands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringCriteria {
    #[serde(default, alias = "domainLength")]
    pub domain_length: Option<RangeCriterion>,
    #[serde(default, alias = "domainExtension")]
    pub domain_extension: Option<ListCriterion>,
    #[serde(default, alias = "domainKeywords")]
    pub domain_keywords: Option<ListCriterion>,

    #[serde(default, alias = "priceRange")]
    pub price_range: Option<RangeCriterion>,
    #[serde(default, alias = "priceNegotiability")]
    pub price_negotiability: Option<WeightedCriterion>,

    #[serde(default, alias = "trafficRange")]
    pub traffic_range: Option<RangeCriterion>,
    #[serde(default, alias = "trafficGrowth")]
    pub traffic_growth: Option<WeightedCriterion>,

    #[serde(default, alias = "sellerPortfolioSize")]
    pub seller_portfolio_size: Option<RangeCriterion>,
    #[serde(default, alias = "sellerResponseTime")]
    pub seller_response_time: Option<WeightedCriterion>,
    #[serde(default, alias = "sellerRating")]
    pub seller_rating: Option<WeightedCriterion>,

    #[serde(default, alias = "categoryMatch")]
    pub category_match: Option<ListCriterion>,
    #[serde(default, alias = "categoryExclusion")]
    pub category_exclusion: Option<ListCriterion>,

    #[serde(default, alias = "marketDemand")]
    pub market_demand: Option<WeightedCriterion>,
    #[serde(default, alias = "marketCompetition")]
    pub market_competition: Option<WeightedCriterion>,
}

impl ScoringCriteria {
    /// Weights of every configured criterion, keyed by criterion name
    pub fn configured_weights(&self) -> Vec<(&'static str, ScoreCategory, f64)> {
        [
            ("domainLength", ScoreCategory::Domain, weight_of(&self.domain_length)),
            ("domainExtension", ScoreCategory::Domain, weight_of(&self.domain_extension)),
            ("domainKeywords", ScoreCategory::Domain, weight_of(&self.domain_keywords)),
            ("priceRange", ScoreCategory::Price, weight_of(&self.price_range)),
            ("priceNegotiability", ScoreCategory::Price, weight_of(&self.price_negotiability)),
            ("trafficRange", ScoreCategory::Traffic, weight_of(&self.traffic_range)),
            ("trafficGrowth", ScoreCategory::Traffic, weight_of(&self.traffic_growth)),
            ("sellerPortfolioSize", ScoreCategory::Seller, weight_of(&self.seller_portfolio_size)),
            ("sellerResponseTime", ScoreCategory::Seller, weight_of(&self.seller_response_time)),
            ("sellerRating", ScoreCategory::Seller, weight_of(&self.seller_rating)),
            ("categoryMatch", ScoreCategory::Category, weight_of(&self.category_match)),
            ("categoryExclusion", ScoreCategory::Category, weight_of(&self.category_exclusion)),
            ("marketDemand", ScoreCategory::Market, weight_of(&self.market_demand)),
            ("marketCompetition", ScoreCategory::Market, weight_of(&self.market_competition)),
        ]
        .into_iter()
        .filter_map(|(name, category, weight)| weight.map(|w| (name, category, w)))
        .collect()
    }

    /// Sum of the weights of every configured criterion
    pub fn max_possible_score(&self) -> f64 {
        self.configured_weights().iter().map(|(_, _, w)| w).sum()
    }

    /// Weights must be finite and non-negative for scores to stay within [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (name, _, weight) in self.configured_weights() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ProspectorError::Config(format!(
                    "scoring criterion {} has invalid weight {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive_and_optional() {
        let range = RangeCriterion::new(5.0, 15.0, 1.0);
        assert!(range.contains(5.0));
        assert!(range.contains(15.0));
        assert!(!range.contains(15.5));

        let open = RangeCriterion {
            min: Some(10.0),
            max: None,
            weight: 1.0,
        };
        assert!(open.contains(1_000_000.0));
        assert!(!open.contains(9.0));
    }

    #[test]
    fn test_max_possible_score_sums_configured_only() {
        let criteria = ScoringCriteria {
            domain_length: Some(RangeCriterion::new(5.0, 15.0, 2.0)),
            market_demand: Some(WeightedCriterion::new(3.0)),
            ..Default::default()
        };
        assert_eq!(criteria.max_possible_score(), 5.0);
        assert_eq!(ScoringCriteria::default().max_possible_score(), 0.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let criteria = ScoringCriteria {
            seller_rating: Some(WeightedCriterion::new(-1.0)),
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_criteria_accept_original_key_names() {
        let criteria: ScoringCriteria = serde_json::from_value(serde_json::json!({
            "domainExtension": { "preferred": ["com"], "weight": 1 },
            "categoryExclusion": { "excluded": ["Adult"], "weight": 1 }
        }))
        .unwrap();
        assert_eq!(criteria.domain_extension.unwrap().values, vec!["com"]);
        assert_eq!(criteria.category_exclusion.unwrap().values, vec!["Adult"]);
    }
}
