#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Assessed parcel record types.
//!
//! A [`PropertyRecord`] is produced by the assessor scraper and consumed
//! read-only by the feasibility engine. Coordinates are validated when
//! they are constructed (including during deserialization), so a record
//! that exists always carries either a well-formed WGS84 pair or none.

pub mod parsing;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a property record or its parts are malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// Latitude/longitude pair is not finite or out of range.
    #[error("Invalid coordinates ({latitude}, {longitude}): {reason}")]
    InvalidCoordinates {
        /// Latitude as supplied.
        latitude: f64,
        /// Longitude as supplied.
        longitude: f64,
        /// Which bound was violated.
        reason: &'static str,
    },

    /// Lot area is zero, negative or not finite.
    #[error("Invalid lot area {0} sq ft: must be a positive number")]
    InvalidLotArea(f64),

    /// Living area is negative or not finite.
    #[error("Invalid living area {0} sq ft: must be zero or positive")]
    InvalidLivingArea(f64),

    /// A required assessor field was missing or unparseable.
    #[error("Missing or unparseable assessor field: {field}")]
    MissingField {
        /// Assessor label that could not be read.
        field: String,
    },
}

/// Assessor parcel identifier (e.g. `"2201486000"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(String);

impl ParcelId {
    /// Wraps a raw parcel identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParcelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates", into = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// Unvalidated wire form of [`Coordinates`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawCoordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidCoordinates`] if either value is not
    /// finite, latitude is outside `[-90, 90]`, or longitude is outside
    /// `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PropertyError> {
        let invalid = |reason| PropertyError::InvalidCoordinates {
            latitude,
            longitude,
            reason,
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(invalid("values must be finite"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid("longitude must be within [-180, 180]"));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = PropertyError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinates> for RawCoordinates {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

/// An assessed parcel as handed over by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    /// Assessor parcel identifier.
    pub parcel_id: ParcelId,
    /// Street address, if the scraper captured one.
    #[serde(default)]
    pub address: Option<String>,
    /// Lot area in square feet. Must be positive.
    pub lot_area_sq_ft: f64,
    /// Finished living area in square feet. Zero for vacant or unrecorded.
    #[serde(default)]
    pub living_area_sq_ft: f64,
    /// Year the main structure was built.
    #[serde(default)]
    pub year_built: Option<i32>,
    /// Number of stories of the main structure.
    #[serde(default)]
    pub stories: Option<f64>,
    /// Assessed land value in whole dollars.
    #[serde(default)]
    pub land_value: Option<u64>,
    /// Assessed building value in whole dollars.
    #[serde(default)]
    pub building_value: Option<u64>,
    /// Parcel location, if geocoded.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Assessor property type (e.g. `"Two-Family Dwelling"`).
    #[serde(default)]
    pub property_type: Option<String>,
    /// Explicit dwelling-unit count, when the assessor reports one.
    #[serde(default)]
    pub unit_count: Option<u32>,
    /// Owner of record.
    #[serde(default)]
    pub owner: Option<String>,
}

impl PropertyRecord {
    /// Creates a record with the required measurements and no optional
    /// attributes.
    #[must_use]
    pub fn new(parcel_id: impl AsRef<str>, lot_area_sq_ft: f64, living_area_sq_ft: f64) -> Self {
        Self {
            parcel_id: ParcelId::new(parcel_id),
            address: None,
            lot_area_sq_ft,
            living_area_sq_ft,
            year_built: None,
            stories: None,
            land_value: None,
            building_value: None,
            coordinates: None,
            property_type: None,
            unit_count: None,
            owner: None,
        }
    }

    /// Sets the street address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the construction year.
    #[must_use]
    pub fn with_year_built(mut self, year: i32) -> Self {
        self.year_built = Some(year);
        self
    }

    /// Sets the story count.
    #[must_use]
    pub fn with_stories(mut self, stories: f64) -> Self {
        self.stories = Some(stories);
        self
    }

    /// Sets the assessed land and building values.
    #[must_use]
    pub fn with_values(mut self, land: u64, building: u64) -> Self {
        self.land_value = Some(land);
        self.building_value = Some(building);
        self
    }

    /// Sets the parcel location.
    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Sets the assessor property type.
    #[must_use]
    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    /// Sets an explicit dwelling-unit count.
    #[must_use]
    pub fn with_unit_count(mut self, units: u32) -> Self {
        self.unit_count = Some(units);
        self
    }

    /// Checks the numeric invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidLotArea`] if the lot area is not a
    /// positive finite number, or [`PropertyError::InvalidLivingArea`] if the
    /// living area is negative or not finite.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if !self.lot_area_sq_ft.is_finite() || self.lot_area_sq_ft <= 0.0 {
            return Err(PropertyError::InvalidLotArea(self.lot_area_sq_ft));
        }
        if !self.living_area_sq_ft.is_finite() || self.living_area_sq_ft < 0.0 {
            return Err(PropertyError::InvalidLivingArea(self.living_area_sq_ft));
        }
        Ok(())
    }

    /// Total assessed value (land + building), if either part is known.
    #[must_use]
    pub fn total_assessed_value(&self) -> Option<u64> {
        match (self.land_value, self.building_value) {
            (None, None) => None,
            (land, building) => Some(land.unwrap_or(0).saturating_add(building.unwrap_or(0))),
        }
    }

    /// Estimated number of dwelling units on the parcel.
    ///
    /// Uses the explicit unit count when present, otherwise infers one unit
    /// per dwelling implied by the property type (`"Two-Family"` → 2).
    /// Falls back to a single unit.
    #[must_use]
    pub fn estimated_units(&self) -> u32 {
        if let Some(units) = self.unit_count {
            return units;
        }
        self.property_type
            .as_deref()
            .and_then(units_from_property_type)
            .unwrap_or(1)
    }
}

/// Infers a unit count from an assessor property-type label.
fn units_from_property_type(property_type: &str) -> Option<u32> {
    let lower = property_type.to_lowercase();
    if !lower.contains("family") {
        return None;
    }
    [
        ("single", 1),
        ("one", 1),
        ("1", 1),
        ("two", 2),
        ("2", 2),
        ("three", 3),
        ("3", 3),
    ]
    .iter()
    .find(|(word, _)| lower.contains(word))
    .map(|(_, units)| *units)
}
