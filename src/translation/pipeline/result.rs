/*!
 * Per-segment workflow records.
 *
 * Every field a stage fills in starts out empty; the Select stage applies
 * all-zero defaults for missing evaluations so it always resolves.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::document::BilingualEntry;
use crate::translation::evaluation::EvaluationResult;
use crate::translation::usage::UsageReport;

/// Suggestion recorded on segments that never reach a model
pub const SIMPLE_SEGMENT_NOTE: &str = "Simple segment, no evaluation needed.";

/// Suggestion recorded when source and target are the same language
pub const SAME_LANGUAGE_NOTE: &str = "Source and Target languages are the same.";

/// Suggestion recorded when an evaluation never arrived
pub const MISSING_EVALUATION_NOTE: &str = "Failed";

/// Which translation a segment ends up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectedModel {
    #[default]
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Skipped (Simple)")]
    SkippedSimple,
    #[serde(rename = "Cached")]
    Cached,
    #[serde(rename = "A (Initial)")]
    Initial,
    #[serde(rename = "C (Optimized)")]
    Optimized,
}

impl SelectedModel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::SkippedSimple => "Skipped (Simple)",
            Self::Cached => "Cached",
            Self::Initial => "A (Initial)",
            Self::Optimized => "C (Optimized)",
        }
    }
}

impl fmt::Display for SelectedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the workflow learned about one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub segment_id: String,
    pub original: String,

    /// Initial translation (model A)
    pub translation_a: Option<String>,
    pub eval_a: Option<EvaluationResult>,

    /// Optimized translation (model C)
    pub translation_c: Option<String>,
    pub eval_c: Option<EvaluationResult>,

    pub final_translation: String,
    pub selected_model: SelectedModel,

    /// The initial translation came from the cache
    #[serde(default)]
    pub from_cache: bool,

    pub translation_a_prompt: Option<String>,
    pub translation_a_raw_response: Option<String>,
    pub eval_a_prompt: Option<String>,
    pub eval_a_raw_response: Option<String>,
    pub translation_c_prompt: Option<String>,
    pub translation_c_raw_response: Option<String>,
    pub eval_c_prompt: Option<String>,
    pub eval_c_raw_response: Option<String>,
}

impl WorkflowResult {
    pub fn new(segment_id: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            original: original.into(),
            translation_a: None,
            eval_a: None,
            translation_c: None,
            eval_c: None,
            final_translation: String::new(),
            selected_model: SelectedModel::Pending,
            from_cache: false,
            translation_a_prompt: None,
            translation_a_raw_response: None,
            eval_a_prompt: None,
            eval_a_raw_response: None,
            translation_c_prompt: None,
            translation_c_raw_response: None,
            eval_c_prompt: None,
            eval_c_raw_response: None,
        }
    }

    pub fn is_simple(&self) -> bool {
        self.selected_model == SelectedModel::SkippedSimple
    }

    /// The model echoed the original back instead of translating it
    pub fn needs_repair(&self) -> bool {
        !self.is_simple()
            && self
                .translation_a
                .as_deref()
                .is_some_and(|translation| translation.trim() == self.original.trim())
    }

    /// Pick the final translation.
    ///
    /// Missing evaluations become all-zero first. The optimized translation
    /// wins only on a strictly higher total; a segment without any
    /// translation falls back to its original text.
    pub fn select(&mut self) {
        let eval_a = self
            .eval_a
            .get_or_insert_with(|| EvaluationResult::zero(MISSING_EVALUATION_NOTE))
            .total_score();
        let eval_c = self
            .eval_c
            .get_or_insert_with(|| EvaluationResult::zero(MISSING_EVALUATION_NOTE))
            .total_score();

        let initial = self.translation_a.clone().unwrap_or_else(|| self.original.clone());

        if self.is_simple() {
            self.final_translation = initial;
        } else if eval_c > eval_a {
            self.final_translation = self.translation_c.clone().unwrap_or(initial);
            self.selected_model = SelectedModel::Optimized;
        } else {
            self.final_translation = initial;
            self.selected_model = SelectedModel::Initial;
        }
    }

    /// Quality score of the selected translation
    pub fn score(&self) -> f32 {
        let evaluation = match self.selected_model {
            SelectedModel::Optimized => self.eval_c.as_ref(),
            _ => self.eval_a.as_ref(),
        };
        evaluation.map(EvaluationResult::total_score).unwrap_or(0.0)
    }
}

/// Output of one workflow run
#[derive(Debug, Clone, Default)]
pub struct WorkflowOutcome {
    /// One record per segment, in segment order
    pub results: Vec<WorkflowResult>,
    pub usage: UsageReport,
}

impl WorkflowOutcome {
    /// Segment id to final translation
    pub fn final_translations(&self) -> HashMap<String, String> {
        self.results
            .iter()
            .map(|result| (result.segment_id.clone(), result.final_translation.clone()))
            .collect()
    }

    /// Segment id to final translation and its score, for bilingual rendering
    pub fn bilingual_entries(&self) -> HashMap<String, BilingualEntry> {
        self.results
            .iter()
            .map(|result| {
                (
                    result.segment_id.clone(),
                    BilingualEntry::new(result.final_translation.clone(), result.score()),
                )
            })
            .collect()
    }

    /// Number of segments that ended with `model`
    pub fn count(&self, model: SelectedModel) -> usize {
        self.results.iter().filter(|result| result.selected_model == model).count()
    }
}
