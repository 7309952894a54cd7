//! Strategy and next steps from feasibility and risk.

use plot_twist_analysis_models::{
    FeasibilityResult, FeasibilityTier, NextStep, Recommendation, RiskCategory, RiskResult,
    RiskTier, Strategy,
};
use plot_twist_zoning_models::DistrictSource;

use crate::risk::{HISTORIC_REVIEW, MAJOR_REVIEW};

const NEAR_TERM: &str = "Near-term (1-3 years)";
const MEDIUM_TERM: &str = "Medium-term (2-5 years)";

/// Standing considerations attached to every recommendation.
pub const KEY_CONSIDERATIONS: [&str; 3] = [
    "Monitor zoning changes and planning initiatives",
    "Track comparable development projects",
    "Maintain relationships with local planning officials",
];

/// Rule names listed per mitigation line.
const MITIGATION_NAMES_PER_CATEGORY: usize = 2;

/// Picks a strategy from the feasibility and overall risk tiers.
///
/// Never rises when feasibility falls: `Low` feasibility always holds,
/// `Medium` is always strategic, and `High` is immediate unless the risk
/// is `High`.
#[must_use]
pub fn strategy_for(feasibility: FeasibilityTier, risk: RiskTier) -> Strategy {
    match (feasibility, risk) {
        (FeasibilityTier::High, RiskTier::Low | RiskTier::Medium) => Strategy::ImmediateAction,
        (FeasibilityTier::High, RiskTier::High) | (FeasibilityTier::Medium, _) => {
            Strategy::StrategicDevelopment
        }
        (FeasibilityTier::Low, _) => Strategy::HoldAndMonitor,
    }
}

/// Next steps in their fixed order, minus any already satisfied. Zoning
/// needs no verification when the city's own service supplied it.
#[must_use]
pub fn next_steps(source: DistrictSource) -> Vec<NextStep> {
    NextStep::ALL
        .into_iter()
        .filter(|step| !(*step == NextStep::VerifyZoning && source == DistrictSource::Authoritative))
        .collect()
}

fn consultations(risk: &RiskResult) -> Vec<&'static str> {
    let mut out = Vec::new();
    if risk.triggered(HISTORIC_REVIEW) {
        out.push("Historic preservation specialist");
    }
    if risk.triggered(MAJOR_REVIEW) {
        out.extend(["Land use attorney", "Community engagement specialist"]);
    }
    out
}

fn risk_mitigation(risk: &RiskResult) -> Vec<String> {
    [RiskCategory::Regulatory, RiskCategory::Market]
        .into_iter()
        .filter_map(|category| {
            let names: Vec<&str> = risk
                .rule_names(category)
                .take(MITIGATION_NAMES_PER_CATEGORY)
                .collect();
            (!names.is_empty())
                .then(|| format!("Address {category} risks: {}", names.join(", ")))
        })
        .collect()
}

/// Combines the stage results into a recommendation.
#[must_use]
pub fn recommend(
    feasibility: &FeasibilityResult,
    risk: &RiskResult,
    source: DistrictSource,
) -> Recommendation {
    let strategy = strategy_for(feasibility.tier, risk.overall_tier);
    let timeline = if strategy == Strategy::ImmediateAction {
        NEAR_TERM
    } else {
        MEDIUM_TERM
    };

    Recommendation {
        strategy,
        next_steps: next_steps(source),
        timeline,
        consultations: consultations(risk),
        risk_mitigation: risk_mitigation(risk),
        key_considerations: KEY_CONSIDERATIONS.to_vec(),
    }
}
