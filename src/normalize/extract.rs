//! Repair of address fragments typed into the wrong column.
//!
//! Spreadsheet exports routinely put the settlement or the building number
//! inside the street cell (`м. Київ, вул. Хрещатик 22`). These helpers split
//! such fragments back out; each returns the original text untouched when it
//! finds nothing to extract.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{has_settlement_prefix, normalize_city, tables};
use crate::core::address::QueryAddress;

static MAJOR_CITIES: Lazy<HashSet<String>> =
    Lazy::new(|| tables::MAJOR_CITIES.iter().map(|c| normalize_city(c)).collect());

/// `<street> <digits><letter?><(/|-)digits?>` optionally followed by `, apt`
/// or `#suffix`.
static TRAILING_BUILDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<street>.*?)\s+(?P<building>\d+\p{L}?(?:[/-]\d+)?)\s*(?:[,#].*)?$")
        .expect("valid regex")
});

/// Building markers left dangling once the number itself is removed
static DANGLING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[,\s]*(?:\bбуд\.?|\bбудинок|\bб\.)?[,\s]*$").expect("valid regex"));

static LEADING_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{5})\b").expect("valid regex"));

static CITY_AFTER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s,])(?:смт\.|м\.|місто\s|с\.|селище\s)\s*([^,]+)").expect("valid regex")
});

static STREET_AFTER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s,])(?:вул\.|вулиця\s|пров\.|провулок\s|бульв\.|бульвар\s|просп\.|проспект\s|пл\.|площа\s)\s*([^,]+)",
    )
    .expect("valid regex")
});

static STREET_BUILDING_CUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:буд\.|будинок\b)").expect("valid regex"));

static BUILDING_AFTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s,])(?:буд\.|будинок\s|№)\s*([^,]+)").expect("valid regex")
});

static BUILDING_SUFFIX_CUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:офіс|кв\.)").expect("valid regex"));

/// Minimum length of a street left behind after removing a building number
const MIN_REMAINING_STREET: usize = 3;

/// True when a leading street segment names a settlement
fn looks_like_settlement(segment: &str) -> bool {
    has_settlement_prefix(segment) || MAJOR_CITIES.contains(&normalize_city(segment))
}

/// Split a leading settlement off a comma-separated street field.
///
/// Returns `(city, remaining_street)`. When the first segment is neither
/// prefixed like a settlement nor one of the major cities, returns an empty
/// city and the input unchanged.
#[must_use]
pub fn try_extract_city(street: &str) -> (String, String) {
    let unchanged = || (String::new(), street.to_string());

    let Some((first, rest)) = street.split_once(',') else {
        return unchanged();
    };

    let first = first.trim();
    if first.is_empty() || !looks_like_settlement(first) {
        return unchanged();
    }

    (first.to_string(), rest.trim().to_string())
}

/// Split a trailing building number off a street field.
///
/// Returns `(building, remaining_street)`. Refuses the split when the street
/// left behind would be shorter than three characters or end in a hyphen,
/// which keeps ordinal names such as `1-го Травня` intact.
#[must_use]
pub fn try_extract_building(street: &str) -> (String, String) {
    let unchanged = || (String::new(), street.to_string());

    let Some(caps) = TRAILING_BUILDING.captures(street.trim()) else {
        return unchanged();
    };
    let (Some(street_part), Some(building)) = (caps.name("street"), caps.name("building")) else {
        return unchanged();
    };

    let remaining = DANGLING_MARKER.replace(street_part.as_str(), "");
    let remaining = remaining.trim();
    if remaining.chars().count() < MIN_REMAINING_STREET || remaining.ends_with('-') {
        return unchanged();
    }

    (building.as_str().to_string(), remaining.to_string())
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a whole address written on one line into its components.
///
/// Recognises a leading 5-digit postal index, a settlement after its type
/// prefix, a street after its type prefix (cut before `буд.`), and a building
/// after `буд.`/`будинок`/`№` (cut before `офіс`/`кв.`).
///
/// ```rust
/// use addr_solver::normalize::parse_full_address;
///
/// let query = parse_full_address("02002, м. Київ, вул. Раїси Окіпної, буд. 4-Б, офіс 12");
/// assert_eq!(query.postal_index(), "02002");
/// assert_eq!(query.city(), "Київ");
/// assert_eq!(query.street(), "Раїси Окіпної");
/// assert_eq!(query.building(), "4-Б");
/// ```
#[must_use]
pub fn parse_full_address(text: &str) -> QueryAddress {
    let mut query = QueryAddress::new();
    let text = text.trim();
    if text.is_empty() {
        return query;
    }

    if let Some(index) = first_capture(&LEADING_INDEX, text) {
        query = query.with_postal_index(index);
    }

    if let Some(city) = first_capture(&CITY_AFTER_PREFIX, text) {
        query = query.with_city(city);
    }

    if let Some(street) = first_capture(&STREET_AFTER_PREFIX, text) {
        let street = STREET_BUILDING_CUT
            .split(&street)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        query = query.with_street(street);
    }

    if let Some(building) = first_capture(&BUILDING_AFTER_MARKER, text) {
        let building = BUILDING_SUFFIX_CUT
            .split(&building)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        query = query.with_building(building);
    }

    query
}
