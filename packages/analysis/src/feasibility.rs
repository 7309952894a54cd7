//! Floor-area feasibility of a parcel against its district envelope.

use plot_twist_analysis_models::{DevelopmentPotential, FeasibilityResult, FeasibilityTier};
use plot_twist_property_models::PropertyRecord;
use plot_twist_zoning_models::ZoningDistrict;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Development-potential cut-offs for each feasibility tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityThresholds {
    /// Potential at or above this is [`FeasibilityTier::High`].
    pub high_threshold: f64,
    /// Potential at or above this is [`FeasibilityTier::Medium`].
    pub medium_threshold: f64,
}

impl Default for FeasibilityThresholds {
    fn default() -> Self {
        Self {
            high_threshold: 0.5,
            medium_threshold: 0.15,
        }
    }
}

impl FeasibilityThresholds {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if either threshold is negative or
    /// not finite, or the medium threshold exceeds the high threshold.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in [
            ("high_threshold", self.high_threshold),
            ("medium_threshold", self.medium_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::Config {
                    message: format!("feasibility.{name} must be a non-negative number, got {value}"),
                });
            }
        }
        if self.medium_threshold > self.high_threshold {
            return Err(AnalysisError::Config {
                message: format!(
                    "feasibility.medium_threshold ({}) exceeds high_threshold ({})",
                    self.medium_threshold, self.high_threshold
                ),
            });
        }
        Ok(())
    }

    fn tier_for(&self, potential: DevelopmentPotential) -> FeasibilityTier {
        if potential.meets(self.high_threshold) {
            FeasibilityTier::High
        } else if potential.meets(self.medium_threshold) {
            FeasibilityTier::Medium
        } else {
            FeasibilityTier::Low
        }
    }
}

/// Rates how much more floor area `district` allows on the parcel.
///
/// A parcel with no living area, or so little that the ratio overflows,
/// has [`DevelopmentPotential::Unbounded`] potential. A parcel already at or over the district's FAR is always
/// [`FeasibilityTier::Low`], whatever the thresholds say.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the lot area is not positive
/// or the living area is negative.
pub fn calculate(
    record: &PropertyRecord,
    district: &ZoningDistrict,
    thresholds: &FeasibilityThresholds,
) -> Result<FeasibilityResult, AnalysisError> {
    record.validate()?;

    let lot_area = record.lot_area_sq_ft;
    let living_area = record.living_area_sq_ft;
    let current_far = living_area / lot_area;
    let max_far = district.max_far;

    let ratio = (max_far - current_far) / current_far;
    let potential = if current_far == 0.0 || !ratio.is_finite() {
        DevelopmentPotential::Unbounded
    } else {
        DevelopmentPotential::Bounded(ratio.max(0.0))
    };

    let tier = if current_far >= max_far {
        FeasibilityTier::Low
    } else {
        thresholds.tier_for(potential)
    };

    let density_increase = max_far > current_far;
    let max_buildable_sq_ft = max_far * lot_area;
    let additional_buildable_sq_ft = (max_buildable_sq_ft - living_area).max(0.0);

    let mut expansion_options = Vec::new();
    if density_increase {
        expansion_options.push(format!("Can increase FAR by {:.2}", max_far - current_far));
        expansion_options.push(format!(
            "Up to {additional_buildable_sq_ft:.0} sq ft of additional floor area"
        ));
    }
    let code = district.code.to_uppercase();
    if code.starts_with("R-") || code.contains("F-") || code == "MFR" {
        expansion_options.push("Residential intensification possible".to_string());
    } else if code.starts_with("B-") {
        expansion_options.push("Commercial/mixed-use development possible".to_string());
    }

    log::debug!(
        "Parcel {}: FAR {current_far:.3} of {max_far:.2}, potential {potential:?}, tier {tier}",
        record.parcel_id
    );

    Ok(FeasibilityResult {
        current_far,
        max_far,
        potential,
        density_increase,
        tier,
        max_buildable_sq_ft,
        additional_buildable_sq_ft,
        expansion_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_twist_property_models::PropertyError;
    use plot_twist_zoning::registry::district_by_code;

    fn two_family() -> &'static ZoningDistrict {
        district_by_code("2F-5000").unwrap()
    }

    fn record(lot: f64, living: f64) -> PropertyRecord {
        PropertyRecord::new("2201486000", lot, living)
    }

    fn calc(lot: f64, living: f64) -> FeasibilityResult {
        calculate(&record(lot, living), two_family(), &FeasibilityThresholds::default()).unwrap()
    }

    #[test]
    fn reference_two_family_parcel() {
        let result = calc(11_525.0, 3_539.0);
        assert!((result.current_far - 0.3071).abs() < 1e-4);
        assert!((result.max_far - 0.6).abs() < f64::EPSILON);
        let potential = result.potential.value().unwrap();
        assert!((potential - 0.954).abs() < 1e-3, "potential was {potential}");
        assert!(result.density_increase);
        assert_eq!(result.tier, FeasibilityTier::High);
        assert!((result.max_buildable_sq_ft - 6_915.0).abs() < 1e-6);
        assert!((result.additional_buildable_sq_ft - 3_376.0).abs() < 1e-6);
        assert_eq!(result.expansion_options[0], "Can increase FAR by 0.29");
    }

    #[test]
    fn empty_lot_is_unbounded_high() {
        let result = calc(5_000.0, 0.0);
        assert!(result.current_far.abs() < f64::EPSILON);
        assert_eq!(result.potential, DevelopmentPotential::Unbounded);
        assert!(result.density_increase);
        assert_eq!(result.tier, FeasibilityTier::High);
    }

    #[test]
    fn vanishing_living_area_is_unbounded_not_infinite() {
        // FAR of 1e-310 is subnormal; dividing by it overflows.
        let result = calc(1e10, 1e-300);
        assert_eq!(result.potential, DevelopmentPotential::Unbounded);
        assert_eq!(result.tier, FeasibilityTier::High);
        assert_eq!(
            serde_json::to_value(result.potential).unwrap(),
            serde_json::json!("unbounded")
        );
    }

    #[test]
    fn medium_and_low_tiers() {
        // FAR 0.5 against 0.6: potential 0.2.
        assert_eq!(calc(10_000.0, 5_000.0).tier, FeasibilityTier::Medium);
        // FAR 0.55 against 0.6: potential ~0.09.
        assert_eq!(calc(10_000.0, 5_500.0).tier, FeasibilityTier::Low);
    }

    #[test]
    fn at_or_over_max_far_is_low_with_zero_potential() {
        let at_max = calc(10_000.0, 6_000.0);
        assert_eq!(at_max.tier, FeasibilityTier::Low);
        assert!(!at_max.density_increase);

        let over = calc(10_000.0, 9_000.0);
        assert_eq!(over.potential, DevelopmentPotential::Bounded(0.0));
        assert_eq!(over.tier, FeasibilityTier::Low);
        assert!((over.additional_buildable_sq_ft).abs() < f64::EPSILON);
        assert!(!over.expansion_options.iter().any(|o| o.starts_with("Can increase")));
    }

    #[test]
    fn zero_thresholds_never_lift_a_maxed_out_parcel() {
        let thresholds = FeasibilityThresholds {
            high_threshold: 0.0,
            medium_threshold: 0.0,
        };
        let result = calculate(&record(10_000.0, 7_000.0), two_family(), &thresholds).unwrap();
        assert_eq!(result.tier, FeasibilityTier::Low);
    }

    #[test]
    fn rejects_non_positive_lot_area() {
        let err = calculate(&record(0.0, 100.0), two_family(), &FeasibilityThresholds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidInput(PropertyError::InvalidLotArea(_))
        ));
        assert!(
            calculate(&record(f64::NAN, 100.0), two_family(), &FeasibilityThresholds::default())
                .is_err()
        );
    }

    #[test]
    fn rejects_negative_living_area() {
        let err = calculate(&record(5_000.0, -1.0), two_family(), &FeasibilityThresholds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidInput(PropertyError::InvalidLivingArea(_))
        ));
    }

    #[test]
    fn more_living_area_never_raises_tier() {
        let mut previous = FeasibilityTier::High;
        for living in (0..=8_000_u32).step_by(250) {
            let tier = calc(10_000.0, f64::from(living)).tier;
            assert!(tier <= previous, "tier rose at living area {living}");
            previous = tier;
        }
    }

    #[test]
    fn larger_max_far_never_lowers_tier() {
        let record = record(10_000.0, 4_000.0);
        let mut previous = FeasibilityTier::Low;
        let mut district = two_family().clone();
        for step in 1..=40_u32 {
            district.max_far = f64::from(step) * 0.05;
            let tier = calculate(&record, &district, &FeasibilityThresholds::default())
                .unwrap()
                .tier;
            assert!(tier >= previous, "tier fell at max FAR {}", district.max_far);
            previous = tier;
        }
    }

    #[test]
    fn calculation_is_idempotent() {
        let record = record(11_525.0, 3_539.0);
        let thresholds = FeasibilityThresholds::default();
        assert_eq!(
            calculate(&record, two_family(), &thresholds).unwrap(),
            calculate(&record, two_family(), &thresholds).unwrap()
        );
    }

    #[test]
    fn threshold_validation() {
        assert!(FeasibilityThresholds::default().validate().is_ok());
        let inverted = FeasibilityThresholds {
            high_threshold: 0.1,
            medium_threshold: 0.2,
        };
        assert!(matches!(inverted.validate(), Err(AnalysisError::Config { .. })));
        let negative = FeasibilityThresholds {
            high_threshold: 0.5,
            medium_threshold: -0.1,
        };
        assert!(negative.validate().is_err());
    }
}
