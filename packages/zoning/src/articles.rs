//! Municode ordinance links for zoning articles and district codes.

use serde::Serialize;

const REDEVELOPMENT_BASE: &str = "https://library.municode.com/ma/boston/codes/redevelopment_authority";
const ORDINANCES_BASE: &str = "https://library.municode.com/ma/boston/codes/code_of_ordinances";

/// Articles that govern a single neighborhood. When a point falls under
/// several overlapping polygons, one of these is the useful answer.
pub const NEIGHBORHOOD_ARTICLES: &[u32] = &[
    50, 51, 53, 54, 55, 56, 58, 59, 61, 62, 64, 65, 66, 67, 68, 69,
];

/// Known landing pages per article. Municode node slugs are irregular, so
/// anything not listed only gets the tables link.
const ARTICLE_MAIN: &[(u32, &str)] = &[
    (13, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART13DIRE_S13-1DIRE"),
    (50, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART50RONEDI"),
    (51, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART51ALIGNEDI_REGULATIONS_APPLICABLE_PLANNED_DEVELOPMENT_AREAS_S51-49PLDEARPUBE"),
    (53, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART53EABONEDI"),
    (54, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART54NOENNEDI_IN_GENERAL_S54-6NOENCEARAR"),
    (55, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART55JAPLNEDI"),
    (56, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART56WERONEDI_REGULATIONS_GOVERNING_DESIGN_S56-37SCBURE"),
    (59, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART59MIHINEDI_REGULATIONS_APPLICABLE_COMMUNITY_FACILITIES_SUBDISTRICTS_S59-20ESCOFASU"),
    (61, "https://mcclibraryweb.azurewebsites.us/ma/boston/codes/redevelopment_authority?nodeId=ART61AUCINEDI_MISCELLANEOUS_PROVISIONS_S61-29DE"),
    (62, "https://www.bostonplans.org/getattachment/b4ec97de-0c3c-4142-aaf9-b2301ec0aaa2"),
    (65, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART65DONEDI_REGULATIONS_APPLICABLE_GREENBELT_PROTECTION_OVERLAY_DISTRICTS_S65-34ESGRPROVDI"),
    (66, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART66TA"),
    (67, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART67RONEDI_IN_GENERAL_S67-5COPA"),
    (68, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART68SOBONEDI"),
    (69, "https://library.municode.com/ma/boston/codes/redevelopment_authority?nodeId=ART69AP"),
];

/// Chapter 66 sections by district-code prefix, first match wins.
const CODE_SECTIONS: &[(&str, &str)] = &[
    ("R-", "?nodeId=TIT6ZOCO_CH66ZO_ART66-2ZODI_66-2REDI"),
    ("B-", "?nodeId=TIT6ZOCO_CH66ZO_ART66-3BUDI"),
    ("MU", "?nodeId=TIT6ZOCO_CH66ZO_ART66-4MIUSDI"),
    ("I-", "?nodeId=TIT6ZOCO_CH66ZO_ART66-5INDI"),
];

const DEFAULT_SECTION: &str = "?nodeId=TIT6ZOCO_CH66ZO";

/// Ordinance links for one zoning article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleLinks {
    /// The article's landing page, when a stable one is known.
    pub main: Option<&'static str>,
    /// The article's dimensional tables. Always present.
    pub tables: String,
}

/// Returns `true` if `article` governs a single neighborhood.
#[must_use]
pub fn is_neighborhood_article(article: u32) -> bool {
    NEIGHBORHOOD_ARTICLES.contains(&article)
}

#[must_use]
pub fn article_links(article: u32) -> ArticleLinks {
    ArticleLinks {
        main: ARTICLE_MAIN
            .iter()
            .find(|(n, _)| *n == article)
            .map(|(_, url)| *url),
        tables: format!("{REDEVELOPMENT_BASE}?nodeId=ART{article}TA"),
    }
}

/// Ordinance section for a district code, falling back to the zoning
/// chapter landing page.
#[must_use]
pub fn municode_link(code: &str) -> String {
    let code = code.trim().to_uppercase();
    let section = CODE_SECTIONS
        .iter()
        .find(|(prefix, _)| code.starts_with(*prefix))
        .map_or(DEFAULT_SECTION, |(_, section)| *section);
    format!("{ORDINANCES_BASE}{section}")
}
