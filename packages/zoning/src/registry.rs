//! Compile-time registry of zoning districts and neighborhood regions.
//!
//! Both tables are TOML files under `data/`, embedded at compile time and
//! parsed once on first use. Everything handed out is `'static`.

use std::sync::LazyLock;

use plot_twist_zoning_models::{NeighborhoodRegion, ZoningDistrict, normalize_code};
use serde::Deserialize;

const DISTRICTS_TOML: &str = include_str!("../data/districts.toml");
const REGIONS_TOML: &str = include_str!("../data/regions.toml");

#[cfg(test)]
const EXPECTED_DISTRICT_COUNT: usize = 11;

#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 13;

#[derive(Debug, Deserialize)]
struct DistrictTable {
    default_code: String,
    districts: Vec<ZoningDistrict>,
}

#[derive(Debug, Deserialize)]
struct RegionTable {
    regions: Vec<NeighborhoodRegion>,
}

static DISTRICTS: LazyLock<DistrictTable> = LazyLock::new(|| {
    toml::de::from_str(DISTRICTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse zoning table 'districts': {e}"))
});

static REGIONS: LazyLock<Vec<NeighborhoodRegion>> = LazyLock::new(|| {
    toml::de::from_str::<RegionTable>(REGIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse zoning table 'regions': {e}"))
        .regions
});

/// Returns every district in the table, in file order.
///
/// # Panics
///
/// Panics if the embedded district table is malformed.
#[must_use]
pub fn all_districts() -> &'static [ZoningDistrict] {
    &DISTRICTS.districts
}

/// Looks up a district by code or alias, ignoring case and whitespace.
///
/// Returns `None` for codes not in the table.
#[must_use]
pub fn district_by_code(code: &str) -> Option<&'static ZoningDistrict> {
    if normalize_code(code).is_empty() {
        return None;
    }
    all_districts().iter().find(|d| d.matches_code(code))
}

/// The conservative fallback district used when nothing else matches.
///
/// # Panics
///
/// Panics if the table's `default_code` names a district that is not in
/// the table.
#[must_use]
pub fn default_district() -> &'static ZoningDistrict {
    district_by_code(&DISTRICTS.default_code).unwrap_or_else(|| {
        panic!(
            "Default district '{}' missing from zoning table",
            DISTRICTS.default_code
        )
    })
}

/// Returns every neighborhood region, in priority order.
///
/// # Panics
///
/// Panics if the embedded region table is malformed.
#[must_use]
pub fn all_regions() -> &'static [NeighborhoodRegion] {
    &REGIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_districts() {
        assert_eq!(all_districts().len(), EXPECTED_DISTRICT_COUNT);
    }

    #[test]
    fn loads_all_regions() {
        assert_eq!(all_regions().len(), EXPECTED_REGION_COUNT);
        assert!(all_regions().len() >= 9);
    }

    #[test]
    fn district_codes_are_unique() {
        let mut seen = BTreeSet::new();
        for d in all_districts() {
            assert!(
                seen.insert(normalize_code(&d.code)),
                "Duplicate district code: {}",
                d.code
            );
        }
    }

    #[test]
    fn region_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for r in all_regions() {
            assert!(seen.insert(&r.id), "Duplicate region ID: {}", r.id);
        }
    }

    #[test]
    fn all_districts_have_valid_envelopes() {
        for d in all_districts() {
            assert!(!d.name.is_empty(), "District {} has empty name", d.code);
            assert!(d.max_far > 0.0, "District {} has non-positive FAR", d.code);
            assert!(d.max_height_ft > 0.0, "District {} has no height", d.code);
            assert!(
                (0.0..=1.0).contains(&d.max_lot_coverage),
                "District {} has coverage outside 0-1",
                d.code
            );
        }
    }

    #[test]
    fn every_region_district_exists() {
        for r in all_regions() {
            assert!(
                district_by_code(&r.district).is_some(),
                "Region {} references unknown district {}",
                r.id,
                r.district
            );
        }
    }

    #[test]
    fn all_regions_have_valid_bounds_and_fragments() {
        for r in all_regions() {
            assert!(r.bounds.min_lat < r.bounds.max_lat, "Region {} lat", r.id);
            assert!(r.bounds.min_lon < r.bounds.max_lon, "Region {} lon", r.id);
            assert!(!r.fragments.is_empty(), "Region {} has no fragments", r.id);
        }
    }

    #[test]
    fn default_is_most_restrictive() {
        let default = default_district();
        for d in all_districts() {
            assert!(default.max_far <= d.max_far, "{} has lower FAR", d.code);
            assert!(
                default.max_height_ft <= d.max_height_ft,
                "{} is lower",
                d.code
            );
        }
    }

    #[test]
    fn lookup_accepts_aliases_and_case() {
        assert_eq!(district_by_code("2f-5000").map(|d| d.code.as_str()), Some("2F-5000"));
        assert_eq!(
            district_by_code("Local  Business").map(|d| d.code.as_str()),
            Some("B-2")
        );
        assert!(district_by_code("Z-99").is_none());
        assert!(district_by_code("   ").is_none());
    }
}
