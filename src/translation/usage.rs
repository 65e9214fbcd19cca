/*!
 * Token usage accounting.
 */

use serde::{Deserialize, Serialize};

use crate::providers::Generation;

/// Prompt, completion and total token counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self { prompt_tokens, completion_tokens, total_tokens }
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl From<&Generation> for TokenUsage {
    fn from(generation: &Generation) -> Self {
        Self::new(generation.prompt_tokens, generation.completion_tokens, generation.total_tokens)
    }
}

/// Pipeline stages that consume tokens. Repair counts as translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageStage {
    Translation,
    Evaluation1,
    Optimization,
    Evaluation2,
}

/// Per-stage usage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUsage {
    pub translation: TokenUsage,
    pub evaluation_1: TokenUsage,
    pub optimization: TokenUsage,
    pub evaluation_2: TokenUsage,
}

/// Usage report emitted once per workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub total: TokenUsage,
    pub stages: StageUsage,
}

impl UsageReport {
    /// Count `usage` against `stage` and the grand total
    pub fn record(&mut self, stage: UsageStage, usage: &TokenUsage) {
        let slot = match stage {
            UsageStage::Translation => &mut self.stages.translation,
            UsageStage::Evaluation1 => &mut self.stages.evaluation_1,
            UsageStage::Optimization => &mut self.stages.optimization,
            UsageStage::Evaluation2 => &mut self.stages.evaluation_2,
        };
        slot.add(usage);
        self.total.add(usage);
    }
}
