/*!
 * Workflow progress reporting.
 *
 * Each stage owns a fixed slice of the overall range and is interpolated by
 * completed tasks over the stage's task count. Reported fractions never go
 * backwards.
 */

use log::debug;
use std::sync::Arc;

/// Receives `(fraction, description)` with `fraction` in `[0, 1]`
pub type ProgressCallback = Arc<dyn Fn(f32, &str) + Send + Sync>;

/// Stages of the translation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Translate,
    Repair,
    Evaluate1,
    Optimize,
    Evaluate2,
    Select,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 6] = [
        WorkflowStage::Translate,
        WorkflowStage::Repair,
        WorkflowStage::Evaluate1,
        WorkflowStage::Optimize,
        WorkflowStage::Evaluate2,
        WorkflowStage::Select,
    ];

    /// Slice of overall progress covered by this stage
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::Translate => (0.0, 0.3),
            Self::Repair => (0.3, 0.35),
            Self::Evaluate1 => (0.35, 0.55),
            Self::Optimize => (0.55, 0.75),
            Self::Evaluate2 => (0.75, 0.95),
            Self::Select => (0.95, 1.0),
        }
    }

    /// Verb used in progress descriptions
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Translate => "Translating",
            Self::Repair => "Repairing",
            Self::Evaluate1 => "Evaluating",
            Self::Optimize => "Optimizing",
            Self::Evaluate2 => "Comparing",
            Self::Select => "Finalizing",
        }
    }
}

/// Tracks and forwards overall workflow progress
pub struct WorkflowProgress {
    callback: Option<ProgressCallback>,
    current: f32,
}

impl WorkflowProgress {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self { callback, current: 0.0 }
    }

    /// Overall fraction reported so far
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Report the start of `stage`
    pub fn start(&mut self, stage: WorkflowStage, description: &str) {
        let (start, _) = stage.range();
        self.report(start, description);
    }

    /// Report `completed` of `total` tasks done within `stage`
    pub fn advance(&mut self, stage: WorkflowStage, completed: usize, total: usize) {
        let (start, end) = stage.range();
        let fraction = if total == 0 {
            end
        } else {
            start + (completed as f32 / total as f32) * (end - start)
        };
        self.report(fraction, &format!("{} {}/{}", stage.verb(), completed, total));
    }

    /// Report completion of the whole workflow
    pub fn finish(&mut self) {
        self.report(1.0, "Done");
    }

    fn report(&mut self, fraction: f32, description: &str) {
        self.current = fraction.clamp(0.0, 1.0).max(self.current);
        debug!("Progress {:.1}%: {}", self.current * 100.0, description);
        if let Some(callback) = &self.callback {
            callback(self.current, description);
        }
    }
}
