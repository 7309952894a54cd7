//! Parsing helpers for scraped assessor values.
//!
//! The assessor site renders every attribute as display text
//! (`"11,525 sq ft"`, `"$1,204,300"`, `"1890"`). These helpers pull the
//! numeric part out and assemble a [`PropertyRecord`] from a label → text
//! map as the scraper hands it over.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::{PropertyError, PropertyRecord};

/// First number in a string, allowing thousands separators and a decimal
/// part.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));

/// Assessed-value labels carry the fiscal year (`"FY2025 Land value"`).
static LAND_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^FY\d{4}\s+land\s+value:?$").expect("valid regex"));

static BUILDING_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^FY\d{4}\s+building\s+value:?$").expect("valid regex"));

/// Extracts the first numeric value from display text.
///
/// Returns `None` when the text contains no digits.
#[must_use]
pub fn parse_numeric(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    m.as_str().replace(',', "").parse::<f64>().ok()
}

/// Extracts a whole-dollar amount from display text such as `"$1,204,300"`.
///
/// Cents are truncated.
#[must_use]
pub fn parse_dollars(text: &str) -> Option<u64> {
    let value = parse_numeric(text)?;
    if value < 0.0 || !value.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.trunc() as u64)
}

/// Parses a four-digit construction year. Assessor pages use `0` or blank
/// for unknown.
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    let year = text.trim().parse::<i32>().ok()?;
    (1600..=9999).contains(&year).then_some(year)
}

/// Builds a [`PropertyRecord`] from assessor labels and their display text.
///
/// Labels are matched case-insensitively. `Lot Size` is required; all
/// other fields are optional. Coordinates are not part of the assessor page
/// and are left unset.
///
/// # Errors
///
/// Returns [`PropertyError::MissingField`] if the parcel id or lot size is
/// missing or unparseable.
pub fn record_from_assessor_fields(
    fields: &BTreeMap<String, String>,
) -> Result<PropertyRecord, PropertyError> {
    let get = |label: &str| {
        fields
            .iter()
            .find(|(k, _)| k.trim().trim_end_matches(':').eq_ignore_ascii_case(label))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    };
    let missing = |field: &str| PropertyError::MissingField {
        field: field.to_string(),
    };

    let parcel_id = get("Parcel ID").ok_or_else(|| missing("Parcel ID"))?;
    let lot_area = get("Lot Size")
        .and_then(parse_numeric)
        .ok_or_else(|| missing("Lot Size"))?;
    let living_area = get("Living Area").and_then(parse_numeric).unwrap_or(0.0);

    let mut record = PropertyRecord::new(parcel_id, lot_area, living_area);
    record.address = get("Address").map(String::from);
    record.property_type = get("Property Type").map(String::from);
    record.owner = get("Owner").map(String::from);
    record.year_built = get("Year Built").and_then(parse_year);
    record.stories = get("Stories").and_then(parse_numeric);

    for (label, value) in fields {
        let label = label.trim();
        if LAND_VALUE_RE.is_match(label) {
            record.land_value = parse_dollars(value);
        } else if BUILDING_VALUE_RE.is_match(label) {
            record.building_value = parse_dollars(value);
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_square_feet_with_separator() {
        assert_eq!(parse_numeric("11,525 sq ft"), Some(11_525.0));
    }

    #[test]
    fn parses_decimal_values() {
        assert_eq!(parse_numeric("FAR 0.6"), Some(0.6));
    }

    #[test]
    fn returns_none_without_digits() {
        assert_eq!(parse_numeric("Unknown"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn parses_dollar_amounts() {
        assert_eq!(parse_dollars("$1,204,300"), Some(1_204_300));
        assert_eq!(parse_dollars("$512,000.75"), Some(512_000));
    }

    #[test]
    fn rejects_placeholder_years() {
        assert_eq!(parse_year("1890"), Some(1890));
        assert_eq!(parse_year("0"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn builds_record_from_assessor_labels() {
        let fields: BTreeMap<String, String> = [
            ("Parcel ID", "2201486000"),
            ("Address", "263 N HARVARD ST BOSTON MA 02134"),
            ("Property Type", "Two-Family Dwelling"),
            ("Lot Size", "11,525 sq ft"),
            ("Living Area", "3,539 sq ft"),
            ("Year Built", "1890"),
            ("FY2025 Land value:", "$812,400"),
            ("FY2025 Building value:", "$498,100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let record = record_from_assessor_fields(&fields).unwrap();
        assert_eq!(record.parcel_id.as_str(), "2201486000");
        assert!((record.lot_area_sq_ft - 11_525.0).abs() < f64::EPSILON);
        assert!((record.living_area_sq_ft - 3_539.0).abs() < f64::EPSILON);
        assert_eq!(record.year_built, Some(1890));
        assert_eq!(record.total_assessed_value(), Some(1_310_500));
        assert_eq!(record.estimated_units(), 2);
    }

    #[test]
    fn missing_lot_size_is_an_error() {
        let fields: BTreeMap<String, String> = [("Parcel ID".to_string(), "1".to_string())]
            .into_iter()
            .collect();
        assert_eq!(
            record_from_assessor_fields(&fields),
            Err(PropertyError::MissingField {
                field: "Lot Size".to_string()
            })
        );
    }
}
