#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for parcel feasibility analysis.
//!
//! [`FeasibilityResult`], [`RiskResult`] and [`Recommendation`] are produced
//! by the three analysis stages and combined into an [`Assessment`], which
//! is what the report writer receives as JSON.

use plot_twist_property_models::PropertyRecord;
use plot_twist_zoning_models::{DistrictSource, ZoningDistrict};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// How much development upside a parcel has. Ordered `Low < Medium < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FeasibilityTier {
    Low,
    Medium,
    High,
}

/// Severity of a risk flag or risk category. Ordered `Low < Medium < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
}

/// Relative headroom between the current and permitted floor-area ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DevelopmentPotential {
    /// `(max FAR - current FAR) / current FAR`, never negative.
    Bounded(f64),
    /// The lot has no built floor area, so any allowed building is
    /// unbounded growth relative to it.
    Unbounded,
}

impl DevelopmentPotential {
    /// Returns `true` if the potential is at or above `threshold`.
    /// [`Self::Unbounded`] meets every threshold.
    #[must_use]
    pub fn meets(self, threshold: f64) -> bool {
        match self {
            Self::Bounded(value) => value >= threshold,
            Self::Unbounded => true,
        }
    }

    /// The bounded fraction, if any.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Bounded(value) => Some(value),
            Self::Unbounded => None,
        }
    }
}

/// Floor-area analysis of a parcel against its district envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityResult {
    /// Living area divided by lot area.
    pub current_far: f64,
    /// District maximum floor-area ratio.
    pub max_far: f64,
    pub potential: DevelopmentPotential,
    /// Whether the district permits more floor area than exists.
    pub density_increase: bool,
    pub tier: FeasibilityTier,
    /// Maximum floor area the district allows on this lot, in square feet.
    pub max_buildable_sq_ft: f64,
    /// Floor area that could still be added, in square feet. Never negative.
    pub additional_buildable_sq_ft: f64,
    /// Short human-readable expansion notes.
    pub expansion_options: Vec<String>,
}

/// Which side of the deal a risk flag affects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RiskCategory {
    Regulatory,
    Market,
}

/// A risk rule whose predicate held for the parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredRule {
    pub name: &'static str,
    pub category: RiskCategory,
    pub tier: RiskTier,
}

/// Outcome of evaluating every risk rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    /// Highest tier among triggered regulatory rules.
    pub regulatory_tier: RiskTier,
    /// Highest tier among triggered market rules.
    pub market_tier: RiskTier,
    /// Highest tier among all triggered rules.
    pub overall_tier: RiskTier,
    /// Triggered rules, in rule-table order.
    pub triggered_rules: Vec<TriggeredRule>,
    /// Expected permitting duration.
    pub approval_timeline: &'static str,
}

impl RiskResult {
    /// Returns `true` if the rule named `name` fired.
    #[must_use]
    pub fn triggered(&self, name: &str) -> bool {
        self.triggered_rules.iter().any(|r| r.name == name)
    }

    /// Names of the triggered rules in `category`, in rule-table order.
    pub fn rule_names(&self, category: RiskCategory) -> impl Iterator<Item = &'static str> + '_ {
        self.triggered_rules
            .iter()
            .filter(move |r| r.category == category)
            .map(|r| r.name)
    }
}

/// Overall development strategy. Ordered from least to most aggressive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Strategy {
    #[serde(rename = "Hold and Monitor")]
    #[strum(serialize = "Hold and Monitor")]
    HoldAndMonitor,
    #[serde(rename = "Strategic Development")]
    #[strum(serialize = "Strategic Development")]
    StrategicDevelopment,
    #[serde(rename = "Immediate Action")]
    #[strum(serialize = "Immediate Action")]
    ImmediateAction,
}

/// A follow-up action, in the fixed order they should be taken.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum NextStep {
    #[serde(rename = "Verify zoning")]
    #[strum(serialize = "Verify zoning")]
    VerifyZoning,
    #[serde(rename = "Market study")]
    #[strum(serialize = "Market study")]
    MarketStudy,
    #[serde(rename = "BPDA engagement")]
    #[strum(serialize = "BPDA engagement")]
    AuthorityEngagement,
    #[serde(rename = "Financial proforma")]
    #[strum(serialize = "Financial proforma")]
    FinancialProforma,
}

impl NextStep {
    /// Every step, in order.
    pub const ALL: [Self; 4] = [
        Self::VerifyZoning,
        Self::MarketStudy,
        Self::AuthorityEngagement,
        Self::FinancialProforma,
    ];
}

/// Financial upside suggested by the development opportunities.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FinancialPotential {
    #[default]
    Medium,
    High,
}

/// Development opportunities read off the parcel and its district.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunities {
    /// Headline opportunities (`"Mixed-use development"`).
    pub primary: Vec<&'static str>,
    /// Concrete building programs worth modelling.
    pub development_scenarios: Vec<&'static str>,
    /// Ways to add value beyond floor area.
    pub value_creation: Vec<&'static str>,
    pub financial_potential: FinancialPotential,
}

/// Strategy and follow-up plan for a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub strategy: Strategy,
    /// Ordered subset of [`NextStep::ALL`].
    pub next_steps: Vec<NextStep>,
    /// When to act (`"Near-term (1-3 years)"`).
    pub timeline: &'static str,
    /// Professionals worth consulting before committing.
    pub consultations: Vec<&'static str>,
    /// One line per risk category with triggered rules.
    pub risk_mitigation: Vec<String>,
    /// Standing concerns to track whatever the strategy.
    pub key_considerations: Vec<&'static str>,
}

/// Ordinance references for the resolved district.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdinanceLinks {
    /// Zoning code section for the district code.
    pub code_section: String,
    /// Landing page of the governing article, when known.
    pub article_main: Option<String>,
    /// Dimensional tables of the governing article.
    pub article_tables: Option<String>,
}

/// Complete analysis of one parcel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment<'a> {
    pub record: &'a PropertyRecord,
    pub district: &'static ZoningDistrict,
    pub district_source: DistrictSource,
    /// Set when the district was guessed rather than observed.
    pub zoning_low_confidence: bool,
    pub neighborhood: Option<String>,
    /// Year used for age-based rules.
    pub assessment_year: i32,
    pub feasibility: FeasibilityResult,
    pub risk: RiskResult,
    pub opportunities: Opportunities,
    pub recommendation: Recommendation,
    pub ordinance: OrdinanceLinks,
}
