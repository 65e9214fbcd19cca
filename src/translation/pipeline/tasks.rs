/*!
 * The four model-calling tasks of the workflow.
 *
 * Each task builds its role prompt, calls the model through the retry
 * policy and returns the parsed value together with the token usage, the
 * prompt that was sent and the raw response text.
 */

use crate::document::Segment;
use crate::errors::ProviderError;
use crate::providers::{Generation, LanguageModel};
use crate::translation::evaluation::{parse_comparative, parse_evaluation, EvaluationResult};
use crate::translation::prompts::{audit_prompt, PromptBuilder};
use crate::translation::retry::RetryPolicy;
use crate::translation::usage::TokenUsage;

/// Value produced by one task plus its audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput<T> {
    pub value: T,
    pub usage: TokenUsage,
    pub prompt: String,
    pub raw_response: String,
}

impl<T> TaskOutput<T> {
    fn new(value: T, generation: &Generation, prompt: String) -> Self {
        Self {
            value,
            usage: TokenUsage::from(generation),
            prompt,
            raw_response: generation.text.clone(),
        }
    }
}

/// Task functions bound to the three model roles of one run
pub struct WorkflowTasks<'a> {
    translator: &'a dyn LanguageModel,
    evaluator: &'a dyn LanguageModel,
    optimizer: &'a dyn LanguageModel,
    prompts: PromptBuilder,
    retry: RetryPolicy,
}

impl<'a> WorkflowTasks<'a> {
    pub fn new(
        translator: &'a dyn LanguageModel,
        evaluator: &'a dyn LanguageModel,
        optimizer: &'a dyn LanguageModel,
        prompts: PromptBuilder,
        retry: RetryPolicy,
    ) -> Self {
        Self { translator, evaluator, optimizer, prompts, retry }
    }

    async fn call(
        &self,
        model: &dyn LanguageModel,
        label: &str,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<Generation, ProviderError> {
        self.retry.run(label, || model.generate(prompt, system_prompt)).await
    }

    /// Initial translation of a segment
    pub async fn translate(&self, segment: &Segment) -> Result<TaskOutput<String>, ProviderError> {
        let system = self.prompts.translate_system();
        let label = format!("Translation of {}", segment.id);
        let generation = self.call(self.translator, &label, &segment.original_text, Some(&system)).await?;

        let text = segment.strip_unknown_placeholders(generation.text.trim());
        Ok(TaskOutput::new(text, &generation, audit_prompt(Some(&system), &segment.original_text)))
    }

    /// Five-dimension evaluation of one translation
    pub async fn evaluate(
        &self,
        segment: &Segment,
        translation: &str,
    ) -> Result<TaskOutput<EvaluationResult>, ProviderError> {
        let prompt = self.prompts.evaluate(&segment.original_text, translation);
        let label = format!("Evaluation of {}", segment.id);
        let generation = self.call(self.evaluator, &label, &prompt, None).await?;

        Ok(TaskOutput::new(parse_evaluation(&generation.text), &generation, audit_prompt(None, &prompt)))
    }

    /// Improved translation guided by the evaluator's suggestions
    pub async fn optimize(
        &self,
        segment: &Segment,
        translation: &str,
        suggestions: &str,
    ) -> Result<TaskOutput<String>, ProviderError> {
        let system = self.prompts.optimize_system();
        let user = self.prompts.optimize_user(&segment.original_text, translation, suggestions);
        let label = format!("Optimization of {}", segment.id);
        let generation = self.call(self.optimizer, &label, &user, Some(&system)).await?;

        let text = segment.strip_unknown_placeholders(generation.text.trim());
        Ok(TaskOutput::new(text, &generation, audit_prompt(Some(&system), &user)))
    }

    /// Side-by-side evaluation of the initial and optimized translations
    pub async fn compare(
        &self,
        segment: &Segment,
        translation_a: &str,
        translation_c: &str,
    ) -> Result<TaskOutput<(EvaluationResult, EvaluationResult)>, ProviderError> {
        let prompt = self.prompts.compare(&segment.original_text, translation_a, translation_c);
        let label = format!("Comparative evaluation of {}", segment.id);
        let generation = self.call(self.evaluator, &label, &prompt, None).await?;

        Ok(TaskOutput::new(parse_comparative(&generation.text), &generation, audit_prompt(None, &prompt)))
    }
}
