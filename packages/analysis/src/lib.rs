#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel feasibility analysis.
//!
//! Four pure stages run in sequence over a [`PropertyRecord`] and its
//! resolved zoning district:
//!
//! 1. [`feasibility::calculate`] derives floor-area ratios and rates the
//!    development upside.
//! 2. [`risk::assess`] evaluates the regulatory and market risk rules.
//! 3. [`opportunities::identify`] lists the development opportunities.
//! 4. [`recommendation::recommend`] turns feasibility and risk into a
//!    strategy and an ordered list of next steps.
//!
//! [`pipeline::analyze`] resolves the district and runs all four.
//! Thresholds come from [`config::AnalysisConfig`].
//!
//! [`PropertyRecord`]: plot_twist_property_models::PropertyRecord

pub mod config;
pub mod feasibility;
pub mod opportunities;
pub mod pipeline;
pub mod recommendation;
pub mod risk;

use plot_twist_property_models::PropertyError;
use thiserror::Error;

pub use config::AnalysisConfig;
pub use pipeline::analyze;

/// Errors surfaced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The property record violates a numeric or coordinate invariant.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] PropertyError),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Which setting was rejected and why.
        message: String,
    },

    /// A configuration file is not valid TOML or has the wrong shape.
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
