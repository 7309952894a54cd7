#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zoning district resolution for Boston parcels.
//!
//! Maps a location to a [`ZoningDistrict`] by walking an ordered chain of
//! strategies, stopping at the first hit:
//!
//! 1. **Coordinate match**: the point falls inside a known neighborhood
//!    region from the embedded [`registry`].
//! 2. **Authoritative**: the BPDA `ArcGIS` zoning layers answer for the
//!    point ([`arcgis`]). Bounded by a timeout; any failure is a miss.
//! 3. **Address pattern**: normalized address tokens match a street or
//!    neighborhood fragment ([`address`]).
//! 4. **Default**: the most restrictive district in the table.
//!
//! The chain lives in [`resolver::ZoningResolver`]; individual strategies
//! implement [`strategy::ResolverStrategy`].
//!
//! [`ZoningDistrict`]: plot_twist_zoning_models::ZoningDistrict

pub mod address;
pub mod arcgis;
pub mod articles;
pub mod registry;
pub mod resolver;
pub mod strategy;

use plot_twist_property_models::Coordinates;
use thiserror::Error;

pub use resolver::{ResolverConfig, ZoningResolver};

/// Errors from the authoritative zoning lookup.
///
/// These never escape [`ZoningResolver::resolve`]; the resolver logs them
/// and falls through to the next strategy.
#[derive(Debug, Error)]
pub enum ZoningError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The `ArcGIS` service answered with an error payload or an
    /// unexpected shape.
    #[error("ArcGIS error: {message}")]
    Arcgis {
        /// Description of the failure.
        message: String,
    },

    /// The lookup did not finish before its deadline.
    #[error("Lookup timed out after {seconds}s")]
    Timeout {
        /// The deadline that elapsed.
        seconds: u64,
    },
}

/// Where to resolve a district for: coordinates, an address, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    /// Parcel coordinates, preferred when present.
    pub coordinates: Option<Coordinates>,
    /// Free-text street address.
    pub address: Option<String>,
}

impl LocationQuery {
    /// Query by coordinates only.
    #[must_use]
    pub const fn at(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            address: None,
        }
    }

    /// Query by address only.
    #[must_use]
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            coordinates: None,
            address: Some(address.into()),
        }
    }
}
