use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{LeadStatus, UnifiedLead};
use crate::observability::metrics;

pub mod criteria;

pub use criteria::{
    ListCriterion, RangeCriterion, ScoreCategory, ScoringCriteria, WeightedCriterion,
};

/// Seller answers faster than this many hours
const FAST_RESPONSE_HOURS: f64 = 24.0;
const TOP_SELLER_RATING: f64 = 4.5;
const HIGH_MARKET_DEMAND: f64 = 0.7;
const LOW_MARKET_COMPETITION: f64 = 0.3;
/// Buckets scoring below this get a recommendation
const RECOMMENDATION_THRESHOLD: f64 = 0.5;

/// Status promotion applied when the total score reaches `min_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoQualifyOnScore {
    #[serde(alias = "minScore")]
    pub min_score: f64,
    pub status: LeadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default)]
    pub criteria: ScoringCriteria,
    #[serde(default, alias = "autoQualify")]
    pub auto_qualify: Option<AutoQualifyOnScore>,
}

/// Normalized score per bucket, each already divided by the global maximum
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub domain: f64,
    pub price: f64,
    pub traffic: f64,
    pub seller: f64,
    pub category: f64,
    pub market: f64,
}

impl CategoryScores {
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Domain => self.domain,
            ScoreCategory::Price => self.price,
            ScoreCategory::Traffic => self.traffic,
            ScoreCategory::Seller => self.seller,
            ScoreCategory::Category => self.category,
            ScoreCategory::Market => self.market,
        }
    }

    fn slot(&mut self, category: ScoreCategory) -> &mut f64 {
        match category {
            ScoreCategory::Domain => &mut self.domain,
            ScoreCategory::Price => &mut self.price,
            ScoreCategory::Traffic => &mut self.traffic,
            ScoreCategory::Seller => &mut self.seller,
            ScoreCategory::Category => &mut self.category,
            ScoreCategory::Market => &mut self.market,
        }
    }

    pub fn sum(&self) -> f64 {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Outcome of one configured criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDetail {
    pub criterion: String,
    pub category: ScoreCategory,
    /// The configured weight, whether or not it was earned
    pub weight: f64,
    pub earned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    /// The scored lead, with its status promoted when auto-qualify applied
    pub lead: UnifiedLead,
    pub total_score: f64,
    pub category_scores: CategoryScores,
    pub details: Vec<CriterionDetail>,
    pub recommendations: Vec<String>,
    pub auto_qualified: bool,
}

/// Weighted, bucketed opportunity scorer
#[derive(Debug, Clone, Default)]
pub struct LeadScorer {
    config: ScorerConfig,
}

impl LeadScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score `lead` and return a copy of it, promoted when auto-qualify applies.
    ///
    /// With no configured criteria every score is 0.
    #[instrument(skip(self, lead), fields(lead = %lead.name))]
    pub fn score(&self, lead: &UnifiedLead) -> LeadScore {
        let criteria = &self.config.criteria;
        let details = self.evaluate(lead);

        let max_possible_score = criteria.max_possible_score();
        let mut earned_total = 0.0;
        let mut raw = CategoryScores::default();
        for detail in details.iter().filter(|d| d.earned) {
            earned_total += detail.weight;
            *raw.slot(detail.category) += detail.weight;
        }

        let (total_score, category_scores) = if max_possible_score > 0.0 {
            let mut normalized = CategoryScores::default();
            for category in ScoreCategory::ALL {
                *normalized.slot(category) = raw.get(category) / max_possible_score;
            }
            (earned_total / max_possible_score, normalized)
        } else {
            (0.0, CategoryScores::default())
        };

        let recommendations = ScoreCategory::ALL
            .iter()
            .filter(|c| category_scores.get(**c) < RECOMMENDATION_THRESHOLD)
            .map(|c| c.recommendation().to_string())
            .collect();

        let mut scored_lead = lead.clone();
        let mut auto_qualified = false;
        if let Some(rule) = &self.config.auto_qualify {
            if total_score >= rule.min_score {
                scored_lead.status = Some(rule.status);
                auto_qualified = true;
                metrics::scoring::lead_auto_qualified(rule.status.as_str());
            }
        }

        debug!(
            "Scored lead {}: {:.3} of max {}",
            lead.name, total_score, max_possible_score
        );
        metrics::scoring::lead_scored(total_score);

        LeadScore {
            lead: scored_lead,
            total_score,
            category_scores,
            details,
            recommendations,
            auto_qualified,
        }
    }

    fn evaluate(&self, lead: &UnifiedLead) -> Vec<CriterionDetail> {
        let criteria = &self.config.criteria;
        let signals = &lead.metadata.signals;
        let domain = lead.name.to_lowercase();
        let extension = domain.rsplit('.').next().unwrap_or_default();

        let earned = |name: &str| -> bool {
            match name {
                "domainLength" => criteria
                    .domain_length
                    .as_ref()
                    .is_some_and(|c| c.contains(domain.chars().count() as f64)),
                "domainExtension" => criteria
                    .domain_extension
                    .as_ref()
                    .is_some_and(|c| c.values.iter().any(|e| e.to_lowercase() == extension)),
                "domainKeywords" => criteria
                    .domain_keywords
                    .as_ref()
                    .is_some_and(|c| c.values.iter().any(|k| domain.contains(&k.to_lowercase()))),
                "priceRange" => criteria
                    .price_range
                    .as_ref()
                    .is_some_and(|c| c.contains(lead.numeric_price())),
                "priceNegotiability" => signals.price_negotiable == Some(true),
                "trafficRange" => criteria
                    .traffic_range
                    .as_ref()
                    .is_some_and(|c| c.contains(lead.numeric_traffic())),
                "trafficGrowth" => signals.traffic_growing == Some(true),
                "sellerPortfolioSize" => criteria
                    .seller_portfolio_size
                    .as_ref()
                    .is_some_and(|c| c.contains(lead.portfolio_size_or_zero() as f64)),
                "sellerResponseTime" => signals
                    .seller_response_time
                    .is_some_and(|hours| hours < FAST_RESPONSE_HOURS),
                "sellerRating" => signals
                    .seller_rating
                    .is_some_and(|rating| rating >= TOP_SELLER_RATING),
                "categoryMatch" => criteria
                    .category_match
                    .as_ref()
                    .is_some_and(|c| c.values.contains(&lead.category)),
                // Rewards the absence of an exclusion, so any lead outside the list earns it
                "categoryExclusion" => criteria
                    .category_exclusion
                    .as_ref()
                    .is_some_and(|c| !c.values.contains(&lead.category)),
                "marketDemand" => signals
                    .market_demand
                    .is_some_and(|demand| demand > HIGH_MARKET_DEMAND),
                "marketCompetition" => signals
                    .market_competition
                    .is_some_and(|competition| competition < LOW_MARKET_COMPETITION),
                _ => false,
            }
        };

        criteria
            .configured_weights()
            .into_iter()
            .map(|(name, category, weight)| CriterionDetail {
                criterion: name.to_string(),
                category,
                weight,
                earned: earned(name),
            })
            .collect()
    }
}
