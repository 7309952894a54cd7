//! Regulatory and market risk flags.
//!
//! Every rule is an independent predicate over the record, its district and
//! the assessment year. Rules are evaluated in table order and each one
//! that holds contributes its tier to its category.

use plot_twist_analysis_models::{RiskCategory, RiskResult, RiskTier, TriggeredRule};
use plot_twist_property_models::PropertyRecord;
use plot_twist_zoning_models::ZoningDistrict;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

pub const MAJOR_REVIEW: &str = "major review threshold";
pub const AFFORDABLE_HOUSING: &str = "affordable-housing set-aside likely";
pub const HISTORIC_REVIEW: &str = "historic review likely";
pub const HIGH_COST_BASIS: &str = "high acquisition cost basis";
pub const HEIGHT_LIMITED: &str = "height-limited district";

const STANDARD_APPROVAL: &str = "6-18 months";
const MAJOR_REVIEW_APPROVAL: &str = "12-24 months";
const HISTORIC_APPROVAL: &str = "18-30 months";

/// Cut-offs for the risk rules, read from the `[risk]` configuration
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub major_review_lot_sq_ft: f64,
    pub affordable_housing_units: u32,
    pub historic_age_years: i32,
    pub high_cost_basis_dollars: u64,
    pub height_limit_ft: f64,
    pub height_limited_stories: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            major_review_lot_sq_ft: 20_000.0,
            affordable_housing_units: 10,
            historic_age_years: 100,
            high_cost_basis_dollars: 1_000_000,
            height_limit_ft: 35.0,
            height_limited_stories: 3.0,
        }
    }
}

impl RiskThresholds {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if a numeric cut-off is negative
    /// or not finite.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in [
            ("major_review_lot_sq_ft", self.major_review_lot_sq_ft),
            ("height_limit_ft", self.height_limit_ft),
            ("height_limited_stories", self.height_limited_stories),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::Config {
                    message: format!("risk.{name} must be a non-negative number, got {value}"),
                });
            }
        }
        if self.historic_age_years < 0 {
            return Err(AnalysisError::Config {
                message: format!(
                    "risk.historic_age_years must not be negative, got {}",
                    self.historic_age_years
                ),
            });
        }
        Ok(())
    }
}

/// What a rule sees.
struct RuleInput<'a> {
    record: &'a PropertyRecord,
    district: &'a ZoningDistrict,
    year: i32,
    thresholds: &'a RiskThresholds,
}

struct RiskRule {
    name: &'static str,
    category: RiskCategory,
    tier: RiskTier,
    applies: fn(&RuleInput<'_>) -> bool,
}

const RULES: &[RiskRule] = &[
    RiskRule {
        name: MAJOR_REVIEW,
        category: RiskCategory::Regulatory,
        tier: RiskTier::High,
        applies: |i| i.record.lot_area_sq_ft > i.thresholds.major_review_lot_sq_ft,
    },
    RiskRule {
        name: AFFORDABLE_HOUSING,
        category: RiskCategory::Regulatory,
        tier: RiskTier::Medium,
        applies: |i| i.record.estimated_units() > i.thresholds.affordable_housing_units,
    },
    RiskRule {
        name: HISTORIC_REVIEW,
        category: RiskCategory::Regulatory,
        tier: RiskTier::Medium,
        applies: |i| {
            i.record
                .year_built
                .is_some_and(|built| i.year.saturating_sub(built) > i.thresholds.historic_age_years)
        },
    },
    RiskRule {
        name: HIGH_COST_BASIS,
        category: RiskCategory::Market,
        tier: RiskTier::Medium,
        applies: |i| {
            i.record
                .total_assessed_value()
                .is_some_and(|total| total > i.thresholds.high_cost_basis_dollars)
        },
    },
    RiskRule {
        name: HEIGHT_LIMITED,
        category: RiskCategory::Regulatory,
        tier: RiskTier::Low,
        applies: |i| {
            i.district.max_height_ft <= i.thresholds.height_limit_ft
                && i.record
                    .stories
                    .is_some_and(|stories| stories >= i.thresholds.height_limited_stories)
        },
    },
];

/// Evaluates every risk rule for the parcel as of `year`.
///
/// Category tiers are the highest tier among that category's triggered
/// rules; with nothing triggered every tier is [`RiskTier::Low`].
#[must_use]
pub fn assess(
    record: &PropertyRecord,
    district: &ZoningDistrict,
    year: i32,
    thresholds: &RiskThresholds,
) -> RiskResult {
    let input = RuleInput {
        record,
        district,
        year,
        thresholds,
    };

    let triggered_rules: Vec<TriggeredRule> = RULES
        .iter()
        .filter(|rule| (rule.applies)(&input))
        .map(|rule| TriggeredRule {
            name: rule.name,
            category: rule.category,
            tier: rule.tier,
        })
        .collect();

    let highest = |category: Option<RiskCategory>| {
        triggered_rules
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .map(|r| r.tier)
            .max()
            .unwrap_or_default()
    };
    let regulatory_tier = highest(Some(RiskCategory::Regulatory));
    let market_tier = highest(Some(RiskCategory::Market));
    let overall_tier = highest(None);

    let fired = |name: &str| triggered_rules.iter().any(|r| r.name == name);
    let approval_timeline = if fired(HISTORIC_REVIEW) {
        HISTORIC_APPROVAL
    } else if fired(MAJOR_REVIEW) {
        MAJOR_REVIEW_APPROVAL
    } else {
        STANDARD_APPROVAL
    };

    for rule in &triggered_rules {
        log::debug!("Parcel {}: risk rule '{}' fired", record.parcel_id, rule.name);
    }

    RiskResult {
        regulatory_tier,
        market_tier,
        overall_tier,
        triggered_rules,
        approval_timeline,
    }
}
