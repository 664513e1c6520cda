//! Canonicalization of Ukrainian address fragments.
//!
//! Every comparison in the matcher runs on text produced here, so the same
//! function must be applied to both the query and the gazetteer side:
//!
//! - [`normalize_text`]: generic lower-casing, Russian → Ukrainian letter
//!   folding, punctuation removal
//! - [`normalize_city`], [`normalize_street`], [`normalize_region`]: strip the
//!   field's type prefix or suffix first, then normalize
//! - [`extract`]: repair fragments typed into the wrong column
//!
//! ## Example
//!
//! ```rust
//! use addr_solver::normalize::{normalize_city, normalize_street};
//!
//! assert_eq!(normalize_city("м. Київ"), normalize_city("Київ,"));
//! assert_eq!(normalize_street("бул.Л.Українки"), normalize_street("бульв. Лесі Українки"));
//! ```

pub mod extract;
pub mod tables;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub use extract::{parse_full_address, try_extract_building, try_extract_city};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-]").expect("valid regex"));

static REGION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:область|обл\.?)\s*$").expect("valid regex"));

static ABBREVIATIONS: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    tables::NAME_ABBREVIATIONS
        .iter()
        .map(|(short, full)| {
            let pattern = format!(r"(?i)\b{}\.\s*", regex::escape(short));
            (
                Regex::new(&pattern).expect("valid regex"),
                format!("{full} "),
            )
        })
        .collect()
});

static RENAMES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    tables::CITY_RENAMES
        .iter()
        .map(|(old, new)| (normalize_text(old), normalize_text(new)))
        .collect()
});

/// Collapse runs of whitespace into single spaces and trim
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if tables::APOSTROPHES.contains(&c) {
            continue;
        }
        match tables::TRANSLITERATION.iter().find(|(from, _)| *from == c) {
            Some((_, Some(to))) => out.push(*to),
            Some((_, None)) => {}
            None => out.push(c),
        }
    }
    out
}

/// Generic normalization used by every field.
///
/// Lower-cases, folds Russian letter variants into Ukrainian ones, drops
/// apostrophes, replaces every other character that is not a word
/// character, whitespace or hyphen with a space, and collapses whitespace.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let lowered = collapse_whitespace(text).to_lowercase();
    let folded = transliterate(&lowered);
    let cleaned = NON_WORD.replace_all(&folded, " ");
    collapse_whitespace(&cleaned)
}

/// Byte offset just past `prefix` when `text` starts with it, ignoring case.
///
/// Prefixes that end in a letter only match as whole words, so `с.` strips
/// from `с.Петрівка` but `село` does not strip from `Селидове`.
fn match_prefix(text: &str, prefix: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    let rest = chars.next();
    let ends_in_letter = prefix.chars().last().is_some_and(char::is_alphabetic);
    match rest {
        None => Some(text.len()),
        Some((offset, next)) => {
            if ends_in_letter && !(next.is_whitespace() || next == ',') {
                None
            } else {
                Some(offset)
            }
        }
    }
}

/// Remove the first matching prefix from the start of `text`
pub(crate) fn strip_type_prefix<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    let trimmed = text.trim_start();
    prefixes
        .iter()
        .find_map(|prefix| match_prefix(trimmed, prefix))
        .map(|offset| trimmed[offset..].trim_start())
}

/// True when `text` opens with a settlement type prefix
#[must_use]
pub fn has_settlement_prefix(text: &str) -> bool {
    strip_type_prefix(text, tables::CITY_PREFIXES).is_some()
}

/// Normalize a settlement name.
///
/// Strips one leading settlement type prefix, normalizes, then maps a
/// renamed settlement onto its current official name.
#[must_use]
pub fn normalize_city(city: &str) -> String {
    if city.trim().is_empty() {
        return String::new();
    }

    let bare = strip_type_prefix(city, tables::CITY_PREFIXES).unwrap_or(city);
    let normalized = normalize_text(bare);
    match RENAMES.get(&normalized) {
        Some(current) => current.clone(),
        None => normalized,
    }
}

/// Normalize a street name.
///
/// Strips one leading street type prefix and expands single-letter given
/// name initials (`Л.` → `лесі`) before normalizing.
#[must_use]
pub fn normalize_street(street: &str) -> String {
    if street.trim().is_empty() {
        return String::new();
    }

    let bare = strip_type_prefix(street, tables::STREET_PREFIXES).unwrap_or(street);
    let mut expanded = bare.to_string();
    for (pattern, full) in ABBREVIATIONS.iter() {
        if pattern.is_match(&expanded) {
            expanded = pattern.replace_all(&expanded, full.as_str()).into_owned();
        }
    }
    normalize_text(&expanded)
}

/// Normalize an oblast name, dropping a trailing `область`/`обл.`
#[must_use]
pub fn normalize_region(region: &str) -> String {
    if region.trim().is_empty() {
        return String::new();
    }

    let bare = REGION_SUFFIX.replace(region.trim(), "");
    normalize_text(&bare)
}

/// Consonant skeleton of `text`, resistant to vowel typos
#[must_use]
pub fn extract_consonants(text: &str) -> String {
    normalize_text(text)
        .chars()
        .filter(|c| c.is_alphabetic() && !tables::VOWELS.contains(c))
        .collect()
}

/// Comparison form of a building number: upper-cased, hyphens and spaces removed
#[must_use]
pub fn building_key(building: &str) -> String {
    building
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Comparison form of a postal index: whitespace and leading zeros removed
#[must_use]
pub fn postal_key(postal_index: &str) -> String {
    let compact: String = postal_index.chars().filter(|c| !c.is_whitespace()).collect();
    compact.trim_start_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Привіт   Світ  "), "привіт світ");
        assert_eq!(normalize_text("Test-123"), "test-123");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_text_transliterates() {
        assert_eq!(normalize_text("Подъезд"), "подезд");
        assert_eq!(normalize_text("Мыло Эхо Ёж"), "мило ехо еж");
        assert_eq!(normalize_text("Київ"), "киів");
    }

    #[test]
    fn test_normalize_text_punctuation() {
        assert_eq!(normalize_text("Київ,"), "киів");
        assert_eq!(normalize_text("Слов'янськ"), "словянськ");
        assert_eq!(normalize_text("a.b;c"), "a b c");
    }

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("м. Київ"), "киів");
        assert_eq!(normalize_city("місто Львів"), "львів");
        assert_eq!(normalize_city("с. Петрівка"), "петрівка");
        assert_eq!(normalize_city("Київ"), "киів");
        assert_eq!(normalize_city("смт. Буча"), "буча");
        assert_eq!(normalize_city("м.Одеса"), "одеса");
    }

    #[test]
    fn test_normalize_city_word_prefix_needs_boundary() {
        assert_eq!(normalize_city("Селидове"), "селидове");
        assert_eq!(normalize_city("Смт"), "");
        assert_eq!(normalize_city("Сміла"), "сміла");
    }

    #[test]
    fn test_kyiv_variants_agree() {
        let expected = normalize_city("м. Київ");
        assert_eq!(normalize_city("Київ,"), expected);
        assert_eq!(normalize_city("місто Київ"), expected);
    }

    #[test]
    fn test_normalize_city_applies_renames() {
        assert_eq!(normalize_city("м. Дніпропетровськ"), normalize_city("Дніпро"));
        assert_eq!(normalize_city("Кіровоград"), "кропивницький");
        assert_eq!(normalize_city("Артемівськ"), "бахмут");
        assert_eq!(normalize_city("Комсомольськ"), "горішні плавні");
    }

    #[test]
    fn test_normalize_street() {
        assert_eq!(normalize_street("вул. Шевченка"), "шевченка");
        assert_eq!(normalize_street("проспект Перемоги"), "перемоги");
        assert_eq!(normalize_street("провулок Тихий"), "тихий");
        assert_eq!(normalize_street("Шевченка вул."), "шевченка вул");
    }

    #[test]
    fn test_normalize_street_expands_initials() {
        assert_eq!(normalize_street("бул.Л.Українки"), "лесі украінки");
        assert_eq!(normalize_street("бульв. Лесі Українки"), "лесі украінки");
        assert_eq!(normalize_street("вул. Т. Шевченка"), "тараса шевченка");
    }

    #[test]
    fn test_normalize_region() {
        assert_eq!(normalize_region("Київська область"), "киівська");
        assert_eq!(normalize_region("Львівська обл."), "львівська");
        assert_eq!(normalize_region("Одеська обл"), "одеська");
        assert_eq!(normalize_region("Волинська"), "волинська");
    }

    #[test]
    fn test_extract_consonants() {
        assert_eq!(extract_consonants("Хрещатик"), "хрщтк");
        assert_eq!(extract_consonants("Аеі"), "");
        assert_eq!(extract_consonants("Буд 12"), "бд");
    }

    #[test]
    fn test_building_key() {
        assert_eq!(building_key("5-а"), "5А");
        assert_eq!(building_key(" 12 Б "), "12Б");
        assert_eq!(building_key("7/2"), "7/2");
    }

    #[test]
    fn test_postal_key() {
        assert_eq!(postal_key("01001"), "1001");
        assert_eq!(postal_key(" 01 001 "), "1001");
        assert_eq!(postal_key("79000"), "79000");
        assert_eq!(postal_key(""), "");
    }
}
