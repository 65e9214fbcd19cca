use anyhow::{Result, anyhow};
use isolang::Language;

use crate::translation::prompts::AUTO_LANGUAGE;

/// Language utilities for prompt wording and language comparison
///
/// Languages reach the workflow either as ISO 639-1 (2-letter) or
/// ISO 639-2 (3-letter) codes, or as free-form names such as "Chinese".

/// ISO 639-2/B codes that differ from their ISO 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve an ISO 639-1 or ISO 639-2 code to a language
pub fn language_from_code(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();
    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == normalized_code)
                .map(|(_, t)| *t)
                .unwrap_or(&normalized_code);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Resolve a code or an English language name
fn resolve(tag: &str) -> Option<Language> {
    let tag = tag.trim();
    language_from_code(tag).or_else(|| {
        let mut chars = tag.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
            None => return None,
        };
        Language::from_name(&capitalized)
    })
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = language_from_code(code)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Language as it should read inside a prompt.
///
/// ISO codes become English names; names and "auto" are kept as given.
pub fn display_language(tag: &str) -> String {
    let tag = tag.trim();
    if tag.eq_ignore_ascii_case(AUTO_LANGUAGE) {
        return tag.to_string();
    }
    get_language_name(tag).unwrap_or_else(|_| tag.to_string())
}

/// Whether source and target denote the same language.
///
/// "auto" never matches. Tags are compared case-insensitively and, when both
/// resolve, by language, so "en" matches "English".
pub fn same_language(source: &str, target: &str) -> bool {
    let source = source.trim();
    let target = target.trim();
    if source.eq_ignore_ascii_case(AUTO_LANGUAGE) {
        return false;
    }
    if source.to_lowercase() == target.to_lowercase() {
        return true;
    }
    match (resolve(source), resolve(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
