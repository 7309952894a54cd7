//! End-to-end analysis of one parcel.

use plot_twist_analysis_models::{Assessment, OrdinanceLinks};
use plot_twist_property_models::PropertyRecord;
use plot_twist_zoning::articles::{article_links, municode_link};
use plot_twist_zoning::{LocationQuery, ZoningResolver};
use plot_twist_zoning_models::ZoningDistrict;

use crate::{AnalysisConfig, AnalysisError, feasibility, opportunities, recommendation, risk};

/// Resolves the parcel's district and runs feasibility, risk,
/// opportunities and recommendation over it.
///
/// The record is validated before any lookup is attempted. Zoning
/// resolution itself never fails; an unresolvable location falls back to
/// the default district and is flagged as low confidence.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the record's lot or living
/// area is invalid.
pub async fn analyze<'a>(
    record: &'a PropertyRecord,
    resolver: &ZoningResolver,
    config: &AnalysisConfig,
) -> Result<Assessment<'a>, AnalysisError> {
    record.validate()?;

    let query = LocationQuery {
        coordinates: record.coordinates,
        address: record.address.clone(),
    };
    let resolved = resolver.resolve(&query).await;
    let district = resolved.district;

    if resolved.source.is_low_confidence() {
        log::warn!(
            "Parcel {}: district {} is a {} guess, verify before relying on it",
            record.parcel_id,
            district.code,
            resolved.source
        );
    }

    let assessment_year = config.assessment_year();
    let feasibility = feasibility::calculate(record, district, &config.feasibility)?;
    let risk = risk::assess(record, district, assessment_year, &config.risk);
    let opportunities =
        opportunities::identify(record, district, &feasibility, &config.opportunities);
    let recommendation = recommendation::recommend(&feasibility, &risk, resolved.source);

    log::info!(
        "Parcel {}: {} feasibility, {} risk, {}",
        record.parcel_id,
        feasibility.tier,
        risk.overall_tier,
        recommendation.strategy
    );

    Ok(Assessment {
        record,
        district,
        district_source: resolved.source,
        zoning_low_confidence: resolved.source.is_low_confidence(),
        neighborhood: resolved.neighborhood,
        assessment_year,
        feasibility,
        risk,
        opportunities,
        recommendation,
        ordinance: ordinance_links(district),
    })
}

fn ordinance_links(district: &ZoningDistrict) -> OrdinanceLinks {
    let article = district.article.map(article_links);
    OrdinanceLinks {
        code_section: municode_link(&district.code),
        article_main: article
            .as_ref()
            .and_then(|links| links.main)
            .map(str::to_string),
        article_tables: article.map(|links| links.tables),
    }
}
