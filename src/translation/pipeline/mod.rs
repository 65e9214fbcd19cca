/*!
 * Multi-stage translation workflow.
 *
 * - `orchestrator`: stage sequencing, caching, usage tracking
 * - `tasks`: the translate, evaluate, optimize and compare model calls
 * - `result`: per-segment records and final selection
 * - `progress`: stage ranges and the progress callback
 */

pub mod orchestrator;
pub mod progress;
pub mod result;
pub mod tasks;

// Re-export types used externally
pub use orchestrator::{TranslationWorkflow, WorkflowSettings};
pub use progress::{ProgressCallback, WorkflowStage};
pub use result::{SelectedModel, WorkflowOutcome, WorkflowResult};
