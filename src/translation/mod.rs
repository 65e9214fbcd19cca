/*!
 * Translation workflow for extracted document segments.
 *
 * This module contains everything between extracted segments and final
 * translations. It is split into several submodules:
 *
 * - `pipeline`: the five-stage workflow and its per-segment results
 * - `prompts`: role prompts and number formatting rules
 * - `evaluation`: evaluation results and lenient evaluator output parsing
 * - `cache`: persistent translation cache
 * - `glossary`: forced term mappings
 * - `simple`: detection of segments that need no translation
 * - `retry`, `concurrency`: call retries and bounded per-stage parallelism
 * - `usage`: token accounting
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::evaluation::EvaluationResult;
pub use self::glossary::{Glossary, GlossaryTerm};
pub use self::pipeline::{
    ProgressCallback, SelectedModel, TranslationWorkflow, WorkflowOutcome, WorkflowResult,
    WorkflowSettings,
};
pub use self::prompts::NumberFormatRule;
pub use self::retry::RetryPolicy;
pub use self::simple::is_simple;
pub use self::usage::{TokenUsage, UsageReport};

// Submodules
pub mod cache;
pub mod concurrency;
pub mod evaluation;
pub mod glossary;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod simple;
pub mod usage;
