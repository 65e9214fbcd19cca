/*!
 * Evaluation results and parsing of evaluator output.
 *
 * Evaluator models answer in free text that should contain one JSON object,
 * possibly wrapped in a markdown code fence. Parsing never fails: anything
 * unreadable becomes an all-zero result carrying the raw response so the
 * problem stays visible in the results dump.
 */

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum score of a single dimension
pub const MAX_SCORE: u8 = 10;

/// Five-dimension quality assessment of one translation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: u8,
    pub fluency: u8,
    pub consistency: u8,
    pub terminology: u8,
    pub completeness: u8,
    pub suggestions: String,

    /// Source language the evaluator detected, when it reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_source_lang: Option<String>,
}

impl EvaluationResult {
    pub fn new(
        accuracy: u8,
        fluency: u8,
        consistency: u8,
        terminology: u8,
        completeness: u8,
        suggestions: impl Into<String>,
    ) -> Self {
        Self {
            accuracy: accuracy.min(MAX_SCORE),
            fluency: fluency.min(MAX_SCORE),
            consistency: consistency.min(MAX_SCORE),
            terminology: terminology.min(MAX_SCORE),
            completeness: completeness.min(MAX_SCORE),
            suggestions: suggestions.into(),
            detected_source_lang: None,
        }
    }

    /// All dimensions at zero
    pub fn zero(reason: impl Into<String>) -> Self {
        Self::new(0, 0, 0, 0, 0, reason)
    }

    /// All dimensions at the maximum
    pub fn perfect(reason: impl Into<String>) -> Self {
        Self::new(MAX_SCORE, MAX_SCORE, MAX_SCORE, MAX_SCORE, MAX_SCORE, reason)
    }

    /// Arithmetic mean of the five dimensions
    pub fn total_score(&self) -> f32 {
        let sum = self.accuracy as f32
            + self.fluency as f32
            + self.consistency as f32
            + self.terminology as f32
            + self.completeness as f32;
        sum / 5.0
    }

    fn from_value(value: &Value) -> Self {
        let mut result = Self::new(
            score(value, "accuracy"),
            score(value, "fluency"),
            score(value, "consistency"),
            score(value, "terminology"),
            score(value, "completeness"),
            match value.get("suggestions") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
        );
        result.detected_source_lang = detected_language(value);
        result
    }
}

fn score(value: &Value, field: &str) -> u8 {
    let raw = match value.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    raw.round().clamp(0.0, MAX_SCORE as f64) as u8
}

fn detected_language(value: &Value) -> Option<String> {
    value
        .get("detected_source_lang")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Strip a markdown code fence around the payload, if there is one
pub fn strip_code_fence(text: &str) -> &str {
    for fence in ["```json", "```markdownjson", "```"] {
        if let Some(start) = text.find(fence) {
            let rest = &text[start + fence.len()..];
            let end = rest.find("```").unwrap_or(rest.len());
            return rest[..end].trim();
        }
    }
    text.trim()
}

/// Find a JSON object in model output
fn extract_object(text: &str) -> Option<Value> {
    let candidate = strip_code_fence(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    // prose around a bare object
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Parse a single-translation evaluation
pub fn parse_evaluation(text: &str) -> EvaluationResult {
    match extract_object(text) {
        Some(value) => EvaluationResult::from_value(&value),
        None => {
            warn!("Failed to parse evaluation JSON: {}", text);
            EvaluationResult::zero(text)
        }
    }
}

/// Parse a side-by-side evaluation into (initial, optimized)
pub fn parse_comparative(text: &str) -> (EvaluationResult, EvaluationResult) {
    let Some(value) = extract_object(text) else {
        warn!("Failed to parse comparative evaluation: {}", text);
        return (EvaluationResult::zero(text), EvaluationResult::zero(text));
    };

    let detected = detected_language(&value);
    let side = |key: &str| {
        let mut result = value
            .get(key)
            .map(EvaluationResult::from_value)
            .unwrap_or_else(|| EvaluationResult::zero(format!("Missing {} in evaluator response", key)));
        if result.detected_source_lang.is_none() {
            result.detected_source_lang = detected.clone();
        }
        result
    };

    (side("model_a"), side("model_c"))
}
