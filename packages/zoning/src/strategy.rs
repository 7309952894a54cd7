//! District resolution strategies.
//!
//! Each strategy answers for a [`LocationQuery`] or declines. Declining is
//! never an error: a strategy that cannot run (no coordinates, lookup
//! failure, unknown code) logs why and returns `None` so the resolver can
//! move on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geo::{Contains, Point, Rect, coord};
use plot_twist_zoning_models::{DistrictSource, NeighborhoodRegion, ZoningDistrict};

use crate::address::{contains_phrase, tokenize, tokenize_verbatim};
use crate::arcgis::AuthoritativeLookup;
use crate::registry::{all_regions, district_by_code};
use crate::{LocationQuery, ZoningError};

/// A district found by a strategy, with the neighborhood it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyHit {
    /// District from the static table.
    pub district: &'static ZoningDistrict,
    /// Neighborhood name, when the strategy knows it.
    pub neighborhood: Option<String>,
}

/// One step of the resolver's fallback chain.
#[async_trait]
pub trait ResolverStrategy: Send + Sync {
    /// Provenance tag attached to hits from this strategy.
    fn source(&self) -> DistrictSource;

    /// Attempts to resolve the query. `None` means "try the next
    /// strategy".
    async fn try_resolve(&self, query: &LocationQuery) -> Option<StrategyHit>;
}

fn region_hit(region: &NeighborhoodRegion) -> Option<StrategyHit> {
    let Some(district) = district_by_code(&region.district) else {
        log::warn!(
            "Region {} names unknown district {}",
            region.id,
            region.district
        );
        return None;
    };
    Some(StrategyHit {
        district,
        neighborhood: Some(region.name.clone()),
    })
}

/// Coordinates inside a neighborhood bounding box. Regions are checked in
/// table order; the first containing region wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMatch;

impl CoordinateMatch {
    fn region_rect(region: &NeighborhoodRegion) -> Rect<f64> {
        let b = region.bounds;
        Rect::new(
            coord! { x: b.min_lon, y: b.min_lat },
            coord! { x: b.max_lon, y: b.max_lat },
        )
    }

    /// Returns the first region whose box strictly contains the point.
    #[must_use]
    pub fn region_at(latitude: f64, longitude: f64) -> Option<&'static NeighborhoodRegion> {
        let point = Point::new(longitude, latitude);
        all_regions()
            .iter()
            .find(|r| Self::region_rect(r).contains(&point))
    }
}

#[async_trait]
impl ResolverStrategy for CoordinateMatch {
    fn source(&self) -> DistrictSource {
        DistrictSource::CoordinateMatch
    }

    async fn try_resolve(&self, query: &LocationQuery) -> Option<StrategyHit> {
        let at = query.coordinates?;
        let region = Self::region_at(at.latitude(), at.longitude())?;
        log::debug!("Coordinates fall inside region {}", region.id);
        region_hit(region)
    }
}

/// Asks the city's zoning service, bounded by a deadline covering every
/// retry.
pub struct Authoritative {
    lookup: Arc<dyn AuthoritativeLookup>,
    deadline: Duration,
}

impl Authoritative {
    #[must_use]
    pub const fn new(lookup: Arc<dyn AuthoritativeLookup>, deadline: Duration) -> Self {
        Self { lookup, deadline }
    }
}

impl std::fmt::Debug for Authoritative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authoritative")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResolverStrategy for Authoritative {
    fn source(&self) -> DistrictSource {
        DistrictSource::Authoritative
    }

    async fn try_resolve(&self, query: &LocationQuery) -> Option<StrategyHit> {
        let at = query.coordinates?;

        let answer = match tokio::time::timeout(self.deadline, self.lookup.lookup(at)).await {
            Ok(Ok(Some(answer))) => answer,
            Ok(Ok(None)) => {
                log::debug!("Zoning service has no polygon at {}, {}", at.latitude(), at.longitude());
                return None;
            }
            Ok(Err(e)) => {
                log::warn!("Zoning service lookup failed: {e}");
                return None;
            }
            Err(_) => {
                let e = ZoningError::Timeout {
                    seconds: self.deadline.as_secs(),
                };
                log::warn!("Zoning service lookup abandoned: {e}");
                return None;
            }
        };

        let Some(code) = answer.code.as_deref() else {
            log::warn!("Zoning service answer has no district code");
            return None;
        };
        let Some(district) = district_by_code(code) else {
            log::warn!("Zoning service returned unknown district code '{code}'");
            return None;
        };

        Some(StrategyHit {
            district,
            neighborhood: answer.neighborhood,
        })
    }
}

/// Street and neighborhood fragments in the address. The longest matching
/// fragment across all regions wins; ties go to the earlier region.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressPattern;

impl AddressPattern {
    /// Returns the region whose longest fragment matches `address`.
    #[must_use]
    pub fn region_for(address: &str) -> Option<&'static NeighborhoodRegion> {
        let tokens = tokenize(address);
        if tokens.is_empty() {
            return None;
        }
        let verbatim = tokenize_verbatim(address);

        let mut best: Option<(usize, &'static NeighborhoodRegion)> = None;
        for region in all_regions() {
            for fragment in &region.fragments {
                let phrase = tokenize(fragment);
                if !contains_phrase(&tokens, &phrase) && !contains_phrase(&verbatim, &phrase) {
                    continue;
                }
                let len = phrase.iter().map(String::len).sum::<usize>() + phrase.len();
                if best.is_none_or(|(best_len, _)| len > best_len) {
                    best = Some((len, region));
                }
            }
        }
        best.map(|(_, region)| region)
    }
}

#[async_trait]
impl ResolverStrategy for AddressPattern {
    fn source(&self) -> DistrictSource {
        DistrictSource::AddressPattern
    }

    async fn try_resolve(&self, query: &LocationQuery) -> Option<StrategyHit> {
        let address = query.address.as_deref()?;
        let region = Self::region_for(address)?;
        log::debug!("Address '{address}' matched region {}", region.id);
        region_hit(region)
    }
}
