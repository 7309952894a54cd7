//! The ordered fallback chain that turns a location into a district.

use std::sync::Arc;
use std::time::Duration;

use plot_twist_zoning_models::{DistrictSource, ResolvedDistrict};
use serde::{Deserialize, Serialize};

use crate::arcgis::{ArcgisZoningLookup, AuthoritativeLookup};
use crate::registry::default_district;
use crate::strategy::{AddressPattern, Authoritative, CoordinateMatch, ResolverStrategy};
use crate::{LocationQuery, ZoningError};

/// Resolver settings, read from the `[zoning]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Whether to query the city's zoning service at all.
    pub authoritative_enabled: bool,
    /// Deadline for the whole authoritative lookup, and the per-request
    /// HTTP timeout.
    pub timeout_secs: u64,
    /// Total request attempts per layer, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub retry_backoff_ms: u64,
    /// Zoning subdistricts layer query endpoint.
    pub subdistricts_url: String,
    /// Zoning districts layer query endpoint.
    pub districts_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            authoritative_enabled: true,
            timeout_secs: 15,
            max_attempts: 2,
            retry_backoff_ms: 500,
            subdistricts_url: "https://gis.bostonplans.org/hosting/rest/services/Zoning_Subdistricts_Data/FeatureServer/0/query".to_string(),
            districts_url: "https://gis.bostonplans.org/hosting/rest/services/Zoning_Districts/FeatureServer/0/query".to_string(),
        }
    }
}

/// Walks its strategies in order and returns the first hit, or the default
/// district when none answers.
///
/// Holds no per-request state; one resolver can serve concurrent calls.
pub struct ZoningResolver {
    strategies: Vec<Box<dyn ResolverStrategy>>,
}

impl std::fmt::Debug for ZoningResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.source()))
            .finish()
    }
}

impl ZoningResolver {
    /// Builds the standard chain: coordinate match, authoritative lookup
    /// (unless disabled), address pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ZoningError::Http`] if the lookup's HTTP client cannot be
    /// built.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ZoningError> {
        if !config.authoritative_enabled {
            log::info!("Authoritative zoning lookup disabled");
            return Ok(Self::offline());
        }
        let lookup = ArcgisZoningLookup::new(config)?;
        Ok(Self::with_lookup(
            Arc::new(lookup),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Standard chain around a caller-supplied authoritative lookup.
    #[must_use]
    pub fn with_lookup(lookup: Arc<dyn AuthoritativeLookup>, deadline: Duration) -> Self {
        Self::with_strategies(vec![
            Box::new(CoordinateMatch),
            Box::new(Authoritative::new(lookup, deadline)),
            Box::new(AddressPattern),
        ])
    }

    /// Chain without the network step.
    #[must_use]
    pub fn offline() -> Self {
        Self::with_strategies(vec![Box::new(CoordinateMatch), Box::new(AddressPattern)])
    }

    #[must_use]
    pub const fn with_strategies(strategies: Vec<Box<dyn ResolverStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolves `query` to a district. Never fails: when no strategy
    /// answers, the conservative default district is returned with source
    /// [`DistrictSource::Default`].
    pub async fn resolve(&self, query: &LocationQuery) -> ResolvedDistrict {
        for strategy in &self.strategies {
            let source = strategy.source();
            log::debug!("Trying zoning strategy {source}");
            if let Some(hit) = strategy.try_resolve(query).await {
                log::info!("Resolved district {} via {source}", hit.district.code);
                return ResolvedDistrict {
                    district: hit.district,
                    source,
                    neighborhood: hit.neighborhood,
                };
            }
        }

        let district = default_district();
        log::info!("No zoning strategy matched, using default district {}", district.code);
        ResolvedDistrict {
            district,
            source: DistrictSource::Default,
            neighborhood: None,
        }
    }
}
