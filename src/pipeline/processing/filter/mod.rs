use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::UnifiedLead;
use crate::observability::metrics;

/// Inclusion and exclusion criteria; every absent field is no constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Leads whose seller portfolio size is unknown fail this check
    #[serde(default, alias = "minPortfolioSize")]
    pub min_portfolio_size: Option<u32>,
    #[serde(default, alias = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(default, alias = "maxPrice")]
    pub max_price: Option<f64>,
    /// Allow-list; an empty list allows every category
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, alias = "excludeCategories")]
    pub exclude_categories: Vec<String>,
}

/// Why a lead was dropped by the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRejection {
    PortfolioUnknown,
    PortfolioTooSmall,
    PriceBelowMinimum,
    PriceAboveMaximum,
    CategoryNotAllowed,
    CategoryExcluded,
}

impl FilterRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterRejection::PortfolioUnknown => "portfolio_unknown",
            FilterRejection::PortfolioTooSmall => "portfolio_too_small",
            FilterRejection::PriceBelowMinimum => "price_below_minimum",
            FilterRejection::PriceAboveMaximum => "price_above_maximum",
            FilterRejection::CategoryNotAllowed => "category_not_allowed",
            FilterRejection::CategoryExcluded => "category_excluded",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub retained: Vec<UnifiedLead>,
    pub rejected_count: usize,
}

/// Applies a [`FilterConfig`] to batches of normalized leads
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    config: FilterConfig,
}

impl LeadFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// First failed constraint for `lead`, or `None` when every constraint passes.
    ///
    /// The constraints are independent, so the order only affects which reason is reported.
    pub fn evaluate(&self, lead: &UnifiedLead) -> Option<FilterRejection> {
        let config = &self.config;

        if let Some(min) = config.min_portfolio_size {
            match lead.seller.portfolio_size {
                None => return Some(FilterRejection::PortfolioUnknown),
                Some(size) if size < min => return Some(FilterRejection::PortfolioTooSmall),
                Some(_) => {}
            }
        }

        if config.min_price.is_some() || config.max_price.is_some() {
            let price = lead.numeric_price();
            if config.min_price.is_some_and(|min| price < min) {
                return Some(FilterRejection::PriceBelowMinimum);
            }
            if config.max_price.is_some_and(|max| price > max) {
                return Some(FilterRejection::PriceAboveMaximum);
            }
        }

        if !config.categories.is_empty() && !config.categories.contains(&lead.category) {
            return Some(FilterRejection::CategoryNotAllowed);
        }

        if config.exclude_categories.contains(&lead.category) {
            return Some(FilterRejection::CategoryExcluded);
        }

        None
    }

    pub fn accepts(&self, lead: &UnifiedLead) -> bool {
        self.evaluate(lead).is_none()
    }

    /// Retained leads keep their input order
    pub fn filter(&self, leads: &[UnifiedLead]) -> FilterOutcome {
        let mut retained = Vec::with_capacity(leads.len());

        for lead in leads {
            match self.evaluate(lead) {
                None => retained.push(lead.clone()),
                Some(reason) => {
                    debug!("Filtered out lead {} ({})", lead.name, reason.as_str());
                    metrics::filter::lead_rejected(reason.as_str());
                }
            }
        }

        metrics::filter::leads_retained(retained.len());
        FilterOutcome {
            rejected_count: leads.len() - retained.len(),
            retained,
        }
    }
}
