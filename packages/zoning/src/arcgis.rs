//! Authoritative zoning lookup against the BPDA `ArcGIS` layers.
//!
//! Issues a point-in-polygon query (`esriSpatialRelIntersects`, WGS84)
//! against the zoning subdistricts layer and, when that returns nothing
//! usable, the coarser zoning districts layer. Response bodies are read
//! as [`serde_json::Value`]; `ArcGIS` reports many errors inside a 200
//! response, so the body is checked for an `error` object before features
//! are read.
//!
//! Transient HTTP failures (connection errors, timeouts, 429, 5xx) are
//! retried with exponential backoff up to the configured attempt count.
//! Retry state lives on the stack of a single call.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use plot_twist_property_models::Coordinates;
use plot_twist_zoning_models::NeighborhoodRegion;
use regex::Regex;
use serde_json::Value;

use crate::ZoningError;
use crate::address::{contains_phrase, tokenize_verbatim};
use crate::articles::is_neighborhood_article;
use crate::registry::{all_regions, district_by_code};
use crate::resolver::ResolverConfig;

const USER_AGENT: &str = "plot-twist/0.1 (zoning lookup)";

const SUBDISTRICT_FIELDS: &str = "Article,Zoning_Subdistrict,Zoning_District,Urban_Name,Map_Number";
const DISTRICT_FIELDS: &str = "ARTICLE,DISTRICT,MAPNO";

/// Article numbers are the leading one to three digits of the `Article`
/// attribute (`"51"`, `"Art. 51"`, `"51A"`).
static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}").expect("valid regex"));

/// What the zoning service says about a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoritativeAnswer {
    /// Subdistrict or district code as the service spells it.
    pub code: Option<String>,
    /// Governing zoning article.
    pub article: Option<u32>,
    /// Neighborhood or zoning district name the polygon belongs to.
    pub neighborhood: Option<String>,
}

/// A source of authoritative district answers for a point.
///
/// `Ok(None)` means the service answered but has no polygon at the point.
#[async_trait]
pub trait AuthoritativeLookup: Send + Sync {
    /// Asks the service which zoning polygon contains `at`.
    async fn lookup(&self, at: Coordinates) -> Result<Option<AuthoritativeAnswer>, ZoningError>;
}

/// [`AuthoritativeLookup`] backed by the BPDA `ArcGIS` feature services.
#[derive(Debug, Clone)]
pub struct ArcgisZoningLookup {
    client: reqwest::Client,
    subdistricts_url: String,
    districts_url: String,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl ArcgisZoningLookup {
    /// Builds a lookup whose HTTP client enforces `config.timeout_secs` per
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`ZoningError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ResolverConfig) -> Result<Self, ZoningError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Builds a lookup around an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            subdistricts_url: config.subdistricts_url.clone(),
            districts_url: config.districts_url.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    async fn point_query(
        &self,
        url: &str,
        at: Coordinates,
        out_fields: &str,
    ) -> Result<Vec<Value>, ZoningError> {
        let geometry = serde_json::json!({ "x": at.longitude(), "y": at.latitude() }).to_string();
        let params = [
            ("f", "json"),
            ("returnGeometry", "false"),
            ("spatialRel", "esriSpatialRelIntersects"),
            ("geometry", geometry.as_str()),
            ("geometryType", "esriGeometryPoint"),
            ("inSR", "4326"),
            ("outFields", out_fields),
        ];

        log::debug!("ArcGIS point query {url} at {}, {}", at.latitude(), at.longitude());
        let json = self.send_json(|| self.client.get(url).query(&params)).await?;
        features(&json)
    }

    /// Sends a request, retrying transient failures, and parses the body as
    /// JSON.
    async fn send_json<F>(&self, build_request: F) -> Result<Value, ZoningError>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            match self.send_once(&build_request).await {
                Ok(body) => return Ok(serde_json::from_str(&body)?),
                Err(Failure::Transient(e)) if attempt < self.max_attempts => {
                    let delay = retry_delay(self.retry_backoff, attempt);
                    log::warn!(
                        "  transient zoning lookup error: {e} (retry {attempt}/{} in {delay:?})",
                        self.max_attempts - 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(Failure::Transient(e) | Failure::Permanent(e)) => return Err(e),
            }
        }
    }

    async fn send_once<F>(&self, build_request: &F) -> Result<String, Failure>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) => return Err(Failure::Transient(e.into())),
            Err(e) => return Err(Failure::Permanent(e.into())),
        };

        let status = response.status();
        if !status.is_success() {
            let e = ZoningError::Arcgis {
                message: format!("HTTP {status}"),
            };
            return Err(if is_transient_status(status) {
                Failure::Transient(e)
            } else {
                Failure::Permanent(e)
            });
        }

        response.text().await.map_err(|e| Failure::Transient(e.into()))
    }
}

#[async_trait]
impl AuthoritativeLookup for ArcgisZoningLookup {
    async fn lookup(&self, at: Coordinates) -> Result<Option<AuthoritativeAnswer>, ZoningError> {
        let subdistricts = self
            .point_query(&self.subdistricts_url, at, SUBDISTRICT_FIELDS)
            .await?;
        if let Some(answer) = pick_subdistrict(&subdistricts) {
            return Ok(Some(answer));
        }

        log::debug!("No mappable subdistrict, falling back to the districts layer");
        let districts = self
            .point_query(&self.districts_url, at, DISTRICT_FIELDS)
            .await?;
        Ok(pick_district(&districts))
    }
}

enum Failure {
    Transient(ZoningError),
    Permanent(ZoningError),
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

/// Rate limiting and server errors are worth retrying; any other
/// unsuccessful status is not.
fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Backoff before retry number `attempt` (1-based): the base delay,
/// doubled for each earlier retry.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Extracts the `features` array from a query response.
///
/// A response without `features` is treated as empty.
///
/// # Errors
///
/// Returns [`ZoningError::Arcgis`] if the body carries an `error` object.
pub fn features(json: &Value) -> Result<Vec<Value>, ZoningError> {
    if json.get("error").is_some() {
        return Err(ZoningError::Arcgis {
            message: format!(
                "ArcGIS API error: {}",
                json["error"]["message"].as_str().unwrap_or("unknown error")
            ),
        });
    }
    Ok(json["features"].as_array().cloned().unwrap_or_default())
}

/// Parses the article number out of an `Article` attribute.
#[must_use]
pub fn article_number(text: &str) -> Option<u32> {
    ARTICLE_RE.find(text)?.as_str().parse().ok()
}

fn text_attr(attrs: &Value, key: &str) -> Option<String> {
    match &attrs[key] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn article_attr(attrs: &Value, key: &str) -> Option<u32> {
    text_attr(attrs, key).as_deref().and_then(article_number)
}

/// Chooses among overlapping subdistrict polygons.
///
/// Only features with an article and a subdistrict code the district table
/// knows are candidates. A candidate governed by a neighborhood article
/// wins; otherwise the first candidate does.
#[must_use]
pub fn pick_subdistrict(features: &[Value]) -> Option<AuthoritativeAnswer> {
    let candidates: Vec<(&Value, String, u32)> = features
        .iter()
        .map(|f| &f["attributes"])
        .filter_map(|attrs| {
            let article = article_attr(attrs, "Article")?;
            let code = text_attr(attrs, "Zoning_Subdistrict")?;
            if district_by_code(&code).is_none() {
                log::debug!("Skipping unmapped subdistrict '{code}' (article {article})");
                return None;
            }
            Some((attrs, code, article))
        })
        .collect();

    let (attrs, code, article) = candidates
        .iter()
        .find(|(_, _, article)| is_neighborhood_article(*article))
        .or_else(|| candidates.first())?;

    Some(AuthoritativeAnswer {
        code: Some(code.clone()),
        article: Some(*article),
        neighborhood: text_attr(attrs, "Zoning_District").or_else(|| text_attr(attrs, "Urban_Name")),
    })
}

/// Maps a districts-layer polygon to a canonical district.
///
/// The districts layer names neighborhood zoning districts
/// (`"Jamaica Plain"`, `"Allston/Brighton"`) rather than subdistrict codes,
/// so the name is matched against the region table and the region's
/// district is reported. The region whose name covers the most of the
/// polygon's name wins; ties go to the earlier region.
#[must_use]
pub fn pick_district(features: &[Value]) -> Option<AuthoritativeAnswer> {
    features.iter().map(|f| &f["attributes"]).find_map(|attrs| {
        let article = article_attr(attrs, "ARTICLE")?;
        let name = text_attr(attrs, "DISTRICT")?;
        let Some(region) = region_named(&name) else {
            log::debug!("Districts layer name '{name}' matches no known region");
            return None;
        };
        Some(AuthoritativeAnswer {
            code: Some(region.district.clone()),
            article: Some(article),
            neighborhood: Some(name),
        })
    })
}

fn region_named(name: &str) -> Option<&'static NeighborhoodRegion> {
    let tokens = tokenize_verbatim(name);
    let mut best: Option<(usize, &'static NeighborhoodRegion)> = None;
    for region in all_regions() {
        let phrase = tokenize_verbatim(&region.name);
        if contains_phrase(&tokens, &phrase)
            && best.is_none_or(|(len, _)| phrase.len() > len)
        {
            best = Some((phrase.len(), region));
        }
    }
    best.map(|(_, region)| region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn parses_leading_article_digits() {
        assert_eq!(article_number("51"), Some(51));
        assert_eq!(article_number("Art. 55A"), Some(55));
        assert_eq!(article_number("none"), None);
    }

    #[test]
    fn error_payload_is_an_error() {
        let body = json!({ "error": { "code": 400, "message": "Invalid geometry" } });
        let err = features(&body).unwrap_err();
        assert!(err.to_string().contains("Invalid geometry"));
    }

    #[test]
    fn missing_features_is_empty() {
        assert!(features(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn prefers_neighborhood_article() {
        let body = json!({ "features": [
            { "attributes": { "Article": "80", "Zoning_Subdistrict": "Overlay" } },
            { "attributes": { "Article": "51", "Zoning_Subdistrict": "2F-5000",
                              "Zoning_District": "Allston/Brighton Neighborhood" } },
        ]});
        let answer = pick_subdistrict(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.article, Some(51));
        assert_eq!(answer.code.as_deref(), Some("2F-5000"));
        assert_eq!(
            answer.neighborhood.as_deref(),
            Some("Allston/Brighton Neighborhood")
        );
    }

    #[test]
    fn falls_back_to_first_article() {
        let body = json!({ "features": [
            { "attributes": { "Zoning_Subdistrict": "No article" } },
            { "attributes": { "Article": 13, "Zoning_Subdistrict": "B-2" } },
            { "attributes": { "Article": "80", "Zoning_Subdistrict": "B-8" } },
        ]});
        let answer = pick_subdistrict(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.article, Some(13));
        assert_eq!(answer.code.as_deref(), Some("B-2"));
    }

    #[test]
    fn no_articled_subdistrict_is_none() {
        let body = json!({ "features": [ { "attributes": { "Zoning_Subdistrict": "2F-5000" } } ] });
        assert_eq!(pick_subdistrict(&features(&body).unwrap()), None);
    }

    #[test]
    fn skips_subdistricts_missing_from_the_table() {
        let body = json!({ "features": [
            { "attributes": { "Article": "51", "Zoning_Subdistrict": "3F-4000" } },
            { "attributes": { "Article": "51", "Zoning_Subdistrict": "2F-5000" } },
        ]});
        let answer = pick_subdistrict(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.code.as_deref(), Some("2F-5000"));
    }

    #[test]
    fn unmapped_neighborhood_article_loses_to_mapped_citywide_one() {
        let body = json!({ "features": [
            { "attributes": { "Article": "55", "Zoning_Subdistrict": "CC-1" } },
            { "attributes": { "Article": "13", "Zoning_Subdistrict": "B-2" } },
        ]});
        let answer = pick_subdistrict(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.code.as_deref(), Some("B-2"));
        assert_eq!(answer.article, Some(13));
    }

    #[test]
    fn nothing_mappable_in_subdistricts_is_none() {
        let body = json!({ "features": [
            { "attributes": { "Article": "51", "Zoning_Subdistrict": "3F-4000" } },
        ]});
        assert_eq!(pick_subdistrict(&features(&body).unwrap()), None);
    }

    #[test]
    fn district_layer_maps_through_region_names() {
        let body = json!({ "features": [
            { "attributes": { "ARTICLE": "55", "DISTRICT": "Jamaica Plain", "MAPNO": "9" } },
        ]});
        let answer = pick_district(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.article, Some(55));
        assert_eq!(answer.code.as_deref(), Some("3F-5000"));
        assert_eq!(answer.neighborhood.as_deref(), Some("Jamaica Plain"));
        assert_eq!(pick_district(&[]), None);
    }

    #[test]
    fn every_region_name_maps_to_a_known_district() {
        for region in all_regions() {
            let body = json!({ "features": [
                { "attributes": { "ARTICLE": "51", "DISTRICT": region.name } },
            ]});
            let answer = pick_district(&features(&body).unwrap()).unwrap();
            let code = answer.code.unwrap();
            assert_eq!(code, region.district, "region {}", region.id);
            assert!(district_by_code(&code).is_some());
        }
    }

    #[test]
    fn district_layer_prefers_longer_region_name() {
        let body = json!({ "features": [
            { "attributes": { "ARTICLE": "56", "DISTRICT": "West Roxbury Neighborhood" } },
        ]});
        let answer = pick_district(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.code.as_deref(), Some("1F-6000"));

        let body = json!({ "features": [
            { "attributes": { "ARTICLE": "51", "DISTRICT": "Allston/Brighton" } },
        ]});
        let answer = pick_district(&features(&body).unwrap()).unwrap();
        assert_eq!(answer.code.as_deref(), Some("2F-5000"));
    }

    #[test]
    fn unknown_district_name_is_none() {
        let body = json!({ "features": [
            { "attributes": { "ARTICLE": "45", "DISTRICT": "Harborpark" } },
        ]});
        assert_eq!(pick_district(&features(&body).unwrap()), None);
    }

    #[test]
    fn status_classification() {
        use reqwest::StatusCode;
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(500));
        assert_eq!(retry_delay(base, 2), Duration::from_millis(1_000));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(2_000));
        assert_eq!(retry_delay(base, 0), base);
        assert!(retry_delay(base, 64) >= retry_delay(base, 33));
    }

    /// Serves `responses` in order, one connection each, and counts the
    /// requests it answered.
    async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0_u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn lookup_for(base: &str, max_attempts: u32) -> ArcgisZoningLookup {
        let config = ResolverConfig {
            subdistricts_url: format!("{base}/subdistricts/query"),
            districts_url: format!("{base}/districts/query"),
            max_attempts,
            retry_backoff_ms: 1,
            ..ResolverConfig::default()
        };
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        ArcgisZoningLookup::with_client(client, &config)
    }

    fn boston() -> Coordinates {
        Coordinates::new(42.31, -71.11).unwrap()
    }

    fn subdistrict_body(code: &str) -> String {
        json!({ "features": [
            { "attributes": { "Article": "55", "Zoning_Subdistrict": code } },
        ]})
        .to_string()
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let (base, hits) = serve(vec![
            (503, "{}".to_string()),
            (200, subdistrict_body("3F-5000")),
        ])
        .await;
        let answer = lookup_for(&base, 2).lookup(boston()).await.unwrap().unwrap();
        assert_eq!(answer.code.as_deref(), Some("3F-5000"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (base, hits) = serve(vec![(503, "{}".to_string()), (503, "{}".to_string())]).await;
        let err = lookup_for(&base, 2).lookup(boston()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (base, hits) = serve(vec![
            (400, "{}".to_string()),
            (200, subdistrict_body("3F-5000")),
        ])
        .await;
        let err = lookup_for(&base, 3).lookup(boston()).await.unwrap_err();
        assert!(err.to_string().contains("400"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unmapped_subdistrict_falls_through_to_districts_layer() {
        let districts = json!({ "features": [
            { "attributes": { "ARTICLE": "55", "DISTRICT": "Jamaica Plain" } },
        ]})
        .to_string();
        let (base, hits) = serve(vec![(200, subdistrict_body("3F-4000")), (200, districts)]).await;
        let answer = lookup_for(&base, 1).lookup(boston()).await.unwrap().unwrap();
        assert_eq!(answer.code.as_deref(), Some("3F-5000"));
        assert_eq!(answer.neighborhood.as_deref(), Some("Jamaica Plain"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
