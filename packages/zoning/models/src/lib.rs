#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zoning district and neighborhood region types.
//!
//! Defines the TOML schema for the static district and region tables and
//! the [`ResolvedDistrict`] produced by the zoning resolver, tagged with
//! the [`DistrictSource`] that found it.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Minimum yard depths required by a district, in feet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Setbacks {
    /// Front yard depth.
    #[serde(default)]
    pub front_ft: Option<f64>,
    /// Side yard width.
    #[serde(default)]
    pub side_ft: Option<f64>,
    /// Rear yard depth.
    #[serde(default)]
    pub rear_ft: Option<f64>,
}

/// A zoning district's dimensional and use envelope.
///
/// The district code uniquely determines every other field; districts are
/// only ever read from the static table.
///
/// The tables are written in snake case; JSON output is camel case like the
/// rest of the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ZoningDistrict {
    /// District code as printed on the zoning map (e.g. `"2F-5000"`).
    pub code: String,
    /// Human-readable district name.
    pub name: String,
    /// Zoning article governing the district, if known.
    #[serde(default)]
    pub article: Option<u32>,
    /// Maximum building height in feet.
    pub max_height_ft: f64,
    /// Maximum floor-area ratio. Always positive.
    pub max_far: f64,
    /// Maximum fraction of the lot a building may cover (0–1).
    pub max_lot_coverage: f64,
    /// Minimum lot area per dwelling unit in square feet.
    #[serde(default)]
    pub min_lot_area_per_unit_sq_ft: Option<f64>,
    /// Uses allowed as of right.
    #[serde(default)]
    pub allowed_uses: Vec<String>,
    /// Uses allowed only with a conditional-use permit.
    #[serde(default)]
    pub conditional_uses: Vec<String>,
    /// Yard requirements.
    #[serde(default)]
    pub setbacks: Setbacks,
    /// Alternate spellings an authoritative service may return for this
    /// district (e.g. `"Two-Family Residential 5000"`).
    #[serde(default, skip_serializing)]
    pub aliases: Vec<String>,
}

impl ZoningDistrict {
    /// Returns `true` if `code` names this district, ignoring case,
    /// surrounding whitespace, and alias spellings.
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        let wanted = normalize_code(code);
        normalize_code(&self.code) == wanted
            || self.aliases.iter().any(|a| normalize_code(a) == wanted)
    }
}

/// Normalizes a district code for comparison: trims, uppercases, and
/// collapses internal whitespace.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// How the resolver arrived at a district. Lower-confidence sources should
/// be flagged by consumers.
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
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DistrictSource {
    /// Coordinates fell inside a known neighborhood region.
    CoordinateMatch,
    /// The city's zoning service answered for the coordinates.
    Authoritative,
    /// Address tokens matched a known street or neighborhood fragment.
    AddressPattern,
    /// Nothing matched; the conservative default district was used.
    Default,
}

impl DistrictSource {
    /// Returns `true` for sources that guess rather than observe.
    #[must_use]
    pub const fn is_low_confidence(self) -> bool {
        matches!(self, Self::AddressPattern | Self::Default)
    }
}

/// A district chosen by the resolver, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDistrict {
    /// The district envelope from the static table.
    pub district: &'static ZoningDistrict,
    /// Which strategy produced the match.
    pub source: DistrictSource,
    /// Neighborhood the match came from, when the strategy knows it.
    pub neighborhood: Option<String>,
}

/// Latitude/longitude bounding box of a neighborhood region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

/// A neighborhood region with its canonical district, deserialized from
/// TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodRegion {
    /// Unique region identifier (e.g. `"allston"`).
    pub id: String,
    /// Human-readable neighborhood name.
    pub name: String,
    /// Canonical district code for the neighborhood.
    pub district: String,
    /// Bounding box used for coordinate matching.
    pub bounds: RegionBounds,
    /// Street and neighborhood name fragments used for address matching.
    #[serde(default)]
    pub fragments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn district() -> ZoningDistrict {
        ZoningDistrict {
            code: "2F-5000".to_string(),
            name: "Two-Family Residential".to_string(),
            article: Some(51),
            max_height_ft: 35.0,
            max_far: 0.6,
            max_lot_coverage: 0.4,
            min_lot_area_per_unit_sq_ft: Some(5_000.0),
            allowed_uses: vec!["Two-family dwelling".to_string()],
            conditional_uses: Vec::new(),
            setbacks: Setbacks::default(),
            aliases: vec!["Two Family  Residential 5000".to_string()],
        }
    }

    #[test]
    fn matches_code_ignores_case_and_whitespace() {
        let d = district();
        assert!(d.matches_code(" 2f-5000 "));
        assert!(d.matches_code("two family residential 5000"));
        assert!(!d.matches_code("3F-5000"));
    }

    #[test]
    fn source_round_trips_through_strum() {
        assert_eq!(DistrictSource::CoordinateMatch.to_string(), "coordinate-match");
        assert_eq!(
            DistrictSource::from_str("address-pattern").unwrap(),
            DistrictSource::AddressPattern
        );
    }

    #[test]
    fn source_serializes_kebab_case() {
        let json = serde_json::to_string(&DistrictSource::Authoritative).unwrap();
        assert_eq!(json, "\"authoritative\"");
    }

    #[test]
    fn low_confidence_sources() {
        assert!(!DistrictSource::CoordinateMatch.is_low_confidence());
        assert!(!DistrictSource::Authoritative.is_low_confidence());
        assert!(DistrictSource::AddressPattern.is_low_confidence());
        assert!(DistrictSource::Default.is_low_confidence());
    }

    #[test]
    fn aliases_are_not_serialized() {
        let json = serde_json::to_value(district()).unwrap();
        assert!(json.get("aliases").is_none());
        assert_eq!(json["maxFar"], 0.6);
    }

    #[test]
    fn district_json_is_camel_case() {
        let json = serde_json::to_value(district()).unwrap();
        assert!(json.get("max_far").is_none());
        assert!(json.get("maxHeightFt").is_some());
        assert!(json.get("maxLotCoverage").is_some());
        assert!(json["setbacks"].get("frontFt").is_some());
    }
}
