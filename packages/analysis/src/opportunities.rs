//! Development opportunities read off the parcel and its district.

use plot_twist_analysis_models::{FeasibilityResult, FinancialPotential, Opportunities};
use plot_twist_property_models::PropertyRecord;
use plot_twist_zoning_models::ZoningDistrict;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

pub const HISTORIC_RENOVATION: &str = "Historic renovation/adaptive reuse";
pub const DENSITY_INCREASE: &str = "Density increase/additional units";
pub const MIXED_USE: &str = "Mixed-use development";
pub const FAR_OPTIMIZATION: &str = "FAR optimization";

/// Cut-offs for the opportunity checks, read from the `[opportunities]`
/// configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityThresholds {
    /// Buildings completed before this year are renovation candidates.
    pub historic_before_year: i32,
    /// Lots larger than this can take additional units.
    pub density_lot_sq_ft: f64,
}

impl Default for OpportunityThresholds {
    fn default() -> Self {
        Self {
            historic_before_year: 1950,
            density_lot_sq_ft: 5_000.0,
        }
    }
}

impl OpportunityThresholds {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if the lot-size cut-off is negative
    /// or not finite.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.density_lot_sq_ft.is_finite() || self.density_lot_sq_ft < 0.0 {
            return Err(AnalysisError::Config {
                message: format!(
                    "opportunities.density_lot_sq_ft must be a non-negative number, got {}",
                    self.density_lot_sq_ft
                ),
            });
        }
        Ok(())
    }
}

/// Lists the opportunities the parcel presents. Checks are independent and
/// report in a fixed order: age, lot size, commercial zoning, FAR headroom.
#[must_use]
pub fn identify(
    record: &PropertyRecord,
    district: &ZoningDistrict,
    feasibility: &FeasibilityResult,
    thresholds: &OpportunityThresholds,
) -> Opportunities {
    let mut out = Opportunities::default();

    if record
        .year_built
        .is_some_and(|year| year < thresholds.historic_before_year)
    {
        out.primary.push(HISTORIC_RENOVATION);
        out.value_creation.push("Historic tax credits potential");
    }

    if record.lot_area_sq_ft > thresholds.density_lot_sq_ft {
        out.primary.push(DENSITY_INCREASE);
        out.development_scenarios.push("Multi-family development");
    }

    if district.code.trim().to_uppercase().starts_with("B-") {
        out.primary.push(MIXED_USE);
        out.development_scenarios
            .push("Ground-floor retail + residential");
        out.financial_potential = FinancialPotential::High;
    }

    if feasibility.density_increase {
        out.primary.push(FAR_OPTIMIZATION);
    }

    out
}
