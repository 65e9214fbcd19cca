/*!
 * Detection of segments that need no translation.
 */

use crate::document::segment::PLACEHOLDER_PATTERN;

/// True when `text` has nothing a model could translate.
///
/// That covers blank text, lone placeholder tokens and anything made only of
/// digits, punctuation, symbols, quotes and placeholders: no alphabetic
/// character in any script.
pub fn is_simple(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return true;
    }
    let without_placeholders = PLACEHOLDER_PATTERN.replace_all(text, "");
    !without_placeholders.chars().any(char::is_alphabetic)
}
