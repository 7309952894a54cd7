//! Address normalization for fragment matching.
//!
//! Assessor and user-supplied addresses arrive in many spellings:
//! - `"263 N HARVARD ST BOSTON MA 02134"`
//! - `"263 North Harvard Street, Allston, MA 02134-1234"`
//! - `"12 South St."`
//!
//! Both the address and each region fragment go through [`tokenize`], so
//! matching compares like with like. Suffixes are abbreviated to their USPS
//! form; directions are abbreviated only in the pre-directional slot
//! (`"263 NORTH HARVARD ST"`), never when they are part of a name
//! (`"WEST ROXBURY"`, `"12 SOUTH ST"`). A house number can still sit in
//! front of a neighborhood name (`"1 WEST ROXBURY PKWY"`), so
//! [`tokenize_verbatim`] keeps the unabbreviated stream for matching too.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a letter or digit separates tokens.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9]+").expect("valid regex"));

static HOUSE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[A-Z]?$").expect("valid regex"));

/// Street suffixes and name words, full form → abbreviation.
static SUFFIXES: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("AVENUE", "AVE"),
        ("AV", "AVE"),
        ("BOULEVARD", "BLVD"),
        ("COURT", "CT"),
        ("DRIVE", "DR"),
        ("MOUNT", "MT"),
        ("PARKWAY", "PKWY"),
        ("PLACE", "PL"),
        ("ROAD", "RD"),
        ("SQUARE", "SQ"),
        ("STREET", "ST"),
        ("TERRACE", "TER"),
    ])
});

static DIRECTIONS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("NORTH", "N"),
        ("SOUTH", "S"),
        ("EAST", "E"),
        ("WEST", "W"),
    ])
});

fn abbreviate_suffix(token: &str) -> &str {
    SUFFIXES.get(token).copied().unwrap_or(token)
}

fn is_suffix(token: &str) -> bool {
    SUFFIXES.values().any(|abbr| *abbr == token)
}

/// Splits an address into uppercase tokens with suffixes abbreviated and
/// every direction word left spelled out.
#[must_use]
pub fn tokenize_verbatim(raw: &str) -> Vec<String> {
    let upper = raw.to_uppercase();
    SEPARATOR_RE
        .split(&upper)
        .filter(|t| !t.is_empty())
        .map(|t| abbreviate_suffix(t).to_string())
        .collect()
}

/// Splits an address into normalized uppercase tokens.
///
/// Punctuation is dropped, suffixes are abbreviated, and a direction word
/// directly after the house number is abbreviated when a street name
/// follows it.
#[must_use]
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = tokenize_verbatim(raw);

    for i in 1..tokens.len() {
        let Some(abbr) = DIRECTIONS.get(tokens[i].as_str()) else {
            continue;
        };
        let after_number = HOUSE_NUMBER_RE.is_match(&tokens[i - 1]);
        let names_street = tokens.get(i + 1).is_some_and(|next| !is_suffix(next));
        if after_number && names_street {
            tokens[i] = (*abbr).to_string();
        }
    }

    tokens
}

/// Returns `true` if `phrase` occurs in `tokens` as a contiguous run of
/// whole tokens.
///
/// An empty phrase never matches.
#[must_use]
pub fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|w| w == phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn strips_punctuation_and_uppercases() {
        assert_eq!(
            toks("263 n. Harvard St., Boston"),
            vec!["263", "N", "HARVARD", "ST", "BOSTON"]
        );
    }

    #[test]
    fn abbreviates_suffixes() {
        assert_eq!(toks("10 Commonwealth Avenue"), vec!["10", "COMMONWEALTH", "AVE"]);
        assert_eq!(toks("1 VFW Parkway"), vec!["1", "VFW", "PKWY"]);
    }

    #[test]
    fn abbreviates_pre_directional() {
        assert_eq!(
            toks("263 North Harvard Street"),
            vec!["263", "N", "HARVARD", "ST"]
        );
    }

    #[test]
    fn keeps_direction_when_it_is_the_street_name() {
        assert_eq!(toks("12 South Street"), vec!["12", "SOUTH", "ST"]);
    }

    #[test]
    fn keeps_direction_in_neighborhood_names() {
        assert_eq!(toks("West Roxbury"), vec!["WEST", "ROXBURY"]);
        assert_eq!(toks("5 Main St, East Boston"), vec!["5", "MAIN", "ST", "EAST", "BOSTON"]);
    }

    #[test]
    fn verbatim_stream_keeps_directions() {
        assert_eq!(
            tokenize_verbatim("1 West Roxbury Parkway"),
            vec!["1", "WEST", "ROXBURY", "PKWY"]
        );
        assert_eq!(toks("1 West Roxbury Parkway"), vec!["1", "W", "ROXBURY", "PKWY"]);
    }

    #[test]
    fn splits_zip_plus_four() {
        assert_eq!(toks("MA 02134-1234"), vec!["MA", "02134", "1234"]);
    }

    #[test]
    fn phrase_matches_whole_tokens_only() {
        let address = toks("10 ROXBURY ST");
        assert!(contains_phrase(&address, &toks("ROXBURY")));
        assert!(!contains_phrase(&toks("10 ROXBURYVILLE ST"), &toks("ROXBURY")));
        assert!(!contains_phrase(&address, &toks("ROX")));
    }

    #[test]
    fn phrase_must_be_contiguous() {
        let address = toks("263 N HARVARD ST");
        assert!(contains_phrase(&address, &toks("N HARVARD ST")));
        assert!(!contains_phrase(&toks("263 N MAIN HARVARD ST"), &toks("N HARVARD ST")));
    }

    #[test]
    fn empty_phrase_never_matches() {
        assert!(!contains_phrase(&toks("1 MAIN ST"), &[]));
    }
}
