/*!
 * # DocuFluent - document translation with evaluation and optimization
 *
 * A Rust library for translating structured documents with language models
 * while keeping their formatting, formulas and embedded objects intact.
 *
 * ## Features
 *
 * - Extract paragraphs from body, tables and header/footer stories
 * - Replace formulas and objects with placeholders the models must keep
 * - Translate, evaluate, optimize and re-evaluate every segment
 * - Pick the better of the initial and optimized translation per segment
 * - Persistent translation cache and glossary support
 * - Write the translated document and a score-colored bilingual copy
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `document`: Document model, extraction, alignment and reconstruction
 * - `translation`: The translation workflow:
 *   - `translation::pipeline`: Stage orchestration and result selection
 *   - `translation::prompts`: Role prompts
 *   - `translation::evaluation`: Evaluator output parsing
 *   - `translation::cache`: Persistent translation cache
 * - `providers`: Language model clients (OpenAI, Azure OpenAI, Anthropic, mock)
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{extract, Document, Reconstructor, Segment};
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{display_language, get_language_name, same_language};
pub use providers::{create_model, Generation, LanguageModel};
pub use translation::{TranslationWorkflow, WorkflowOutcome, WorkflowResult};
