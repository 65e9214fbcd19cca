/*!
 * Translatable segments and placeholder tokens.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::{EmbeddedKind, EmbeddedObject, ParagraphKey};

/// Matches any placeholder token, capturing the numeric suffix
pub static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:MATH|OBJ)_(\d+)\}\}").unwrap());

/// Token standing in for the n-th embedded object of a paragraph
pub fn placeholder_token(kind: EmbeddedKind, index: usize) -> String {
    match kind {
        EmbeddedKind::Formula => format!("{{{{MATH_{}}}}}", index),
        EmbeddedKind::Object => format!("{{{{OBJ_{}}}}}", index),
    }
}

/// One unit of translatable text taken from a single paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Path-based id, unique within one extraction
    pub id: String,

    /// Trimmed paragraph text with placeholder tokens in place of embedded objects
    pub original_text: String,

    /// Placeholder token to a copy of the embedded object it replaced
    #[serde(default)]
    pub placeholders: BTreeMap<String, EmbeddedObject>,

    /// Where the paragraph lives in the source document
    pub container_ref: ParagraphKey,
}

impl Segment {
    pub fn has_placeholder(&self, token: &str) -> bool {
        self.placeholders.contains_key(token)
    }

    /// Replace placeholder tokens the segment does not own with their bare number.
    ///
    /// Models occasionally invent `{{MATH_7}}` style tokens; anything not backed
    /// by an embedded object would otherwise leak into the output verbatim.
    pub fn strip_unknown_placeholders(&self, text: &str) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(text, |caps: &regex::Captures| {
                let token = &caps[0];
                if self.has_placeholder(token) {
                    token.to_string()
                } else {
                    caps[1].to_string()
                }
            })
            .into_owned()
    }
}
