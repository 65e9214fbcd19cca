/*!
 * Workflow orchestrator for the five-stage translation pipeline.
 *
 * Stages run in order with a barrier between them:
 * 1. Translate: cache lookup, then the translator for every miss
 * 2. Repair: one more attempt for translations that echo the original
 * 3. Evaluate-1: evaluator scores the initial translation
 * 4. Optimize: optimizer reworks translations scoring below the threshold
 * 5. Evaluate-2: comparative scoring of initial and optimized translations
 *
 * followed by Select, which picks the final text without any model call.
 * Tasks only return values; the orchestrator alone writes results, usage
 * and the cache.
 */

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::{Config, StageConcurrency};
use crate::document::Segment;
use crate::language_utils::same_language;
use crate::providers::LanguageModel;
use crate::translation::cache::TranslationCache;
use crate::translation::concurrency::run_bounded;
use crate::translation::evaluation::EvaluationResult;
use crate::translation::glossary::Glossary;
use crate::translation::prompts::{NumberFormatRule, PromptBuilder};
use crate::translation::retry::RetryPolicy;
use crate::translation::simple::is_simple;
use crate::translation::usage::{UsageReport, UsageStage};

use super::progress::{ProgressCallback, WorkflowProgress, WorkflowStage};
use super::result::{
    SelectedModel, WorkflowOutcome, WorkflowResult, SAME_LANGUAGE_NOTE, SIMPLE_SEGMENT_NOTE,
};
use super::tasks::{TaskOutput, WorkflowTasks};

/// Tunables of one workflow
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Tasks in flight per stage; repair shares the translation limit
    pub concurrency: StageConcurrency,

    /// Retry policy applied to every model call
    pub retry: RetryPolicy,

    /// Initial score at or above which optimization is skipped
    pub optimization_threshold: f32,

    /// Number formatting instructions selected by target language
    pub number_format_rules: Vec<NumberFormatRule>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            concurrency: StageConcurrency::default(),
            retry: RetryPolicy::default(),
            optimization_threshold: 9.5,
            number_format_rules: vec![NumberFormatRule::russian()],
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            retry: config.retry_policy(),
            optimization_threshold: config.optimization_threshold,
            number_format_rules: config.number_format_rules.clone(),
        }
    }
}

/// Mutable state of one run, owned by the orchestrator
struct RunState<'a> {
    source_language: &'a str,
    target_language: &'a str,
    results: HashMap<String, WorkflowResult>,
    usage: UsageReport,
    progress: WorkflowProgress,
}

/// The translate, evaluate, optimize, compare and select workflow
pub struct TranslationWorkflow {
    translator: Arc<dyn LanguageModel>,
    evaluator: Arc<dyn LanguageModel>,
    optimizer: Arc<dyn LanguageModel>,
    settings: WorkflowSettings,
    glossary: Glossary,
    cache: TranslationCache,
}

impl TranslationWorkflow {
    /// Create a workflow with default settings and an in-memory cache
    pub fn new(
        translator: Arc<dyn LanguageModel>,
        evaluator: Arc<dyn LanguageModel>,
        optimizer: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            translator,
            evaluator,
            optimizer,
            settings: WorkflowSettings::default(),
            glossary: Glossary::default(),
            cache: TranslationCache::new(true),
        }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Translator, evaluator and optimizer, in that order
    pub fn models(&self) -> (&Arc<dyn LanguageModel>, &Arc<dyn LanguageModel>, &Arc<dyn LanguageModel>) {
        (&self.translator, &self.evaluator, &self.optimizer)
    }

    /// Run every stage over `segments`.
    ///
    /// Always returns one result per segment, in segment order. Model failures
    /// are logged and leave the affected fields empty for Select to default.
    pub async fn run(
        &self,
        segments: &[Segment],
        source_language: &str,
        target_language: &str,
        progress: Option<ProgressCallback>,
    ) -> WorkflowOutcome {
        let start_time = Instant::now();
        let prompts = PromptBuilder::new(
            source_language,
            target_language,
            &self.glossary,
            &self.settings.number_format_rules,
        );
        let tasks = WorkflowTasks::new(
            self.translator.as_ref(),
            self.evaluator.as_ref(),
            self.optimizer.as_ref(),
            prompts,
            self.settings.retry,
        );

        let mut state = RunState {
            source_language,
            target_language,
            results: segments
                .iter()
                .map(|segment| (segment.id.clone(), WorkflowResult::new(&segment.id, &segment.original_text)))
                .collect(),
            usage: UsageReport::default(),
            progress: WorkflowProgress::new(progress),
        };

        info!(
            "Starting workflow for {} segments ({} -> {})",
            segments.len(),
            source_language,
            target_language
        );

        self.translate_stage(&tasks, segments, &mut state).await;
        self.repair_stage(&tasks, segments, &mut state).await;
        self.evaluate_stage(&tasks, segments, &mut state).await;
        self.optimize_stage(&tasks, segments, &mut state).await;
        self.compare_stage(&tasks, segments, &mut state).await;
        let outcome = Self::select_stage(segments, state);

        let (hits, misses, _) = self.cache.stats();
        info!(
            "Workflow finished in {:.1}s: {} initial, {} optimized, {} simple, {} cache hits, {} misses, {} tokens",
            start_time.elapsed().as_secs_f32(),
            outcome.count(SelectedModel::Initial),
            outcome.count(SelectedModel::Optimized),
            outcome.count(SelectedModel::SkippedSimple),
            hits,
            misses,
            outcome.usage.total.total_tokens
        );

        outcome
    }

    async fn translate_stage(&self, tasks: &WorkflowTasks<'_>, segments: &[Segment], state: &mut RunState<'_>) {
        state.progress.start(WorkflowStage::Translate, "Starting translation...");

        let mut pending = Vec::new();
        for segment in segments {
            let Some(result) = state.results.get_mut(&segment.id) else { continue };

            if is_simple(&segment.original_text) {
                result.translation_a = Some(segment.original_text.clone());
                result.selected_model = SelectedModel::SkippedSimple;
                continue;
            }

            let original = segment.original_text.trim();
            if let Some(cached) = self.cache.get_accepted(
                &segment.original_text,
                state.source_language,
                state.target_language,
                |translation| translation.trim() != original,
            ) {
                result.translation_a = Some(cached);
                result.selected_model = SelectedModel::Cached;
                result.from_cache = true;
                continue;
            }

            pending.push(segment);
        }

        info!("Translating {} segments ({} simple or cached)", pending.len(), segments.len() - pending.len());
        let futures: Vec<_> = pending
            .iter()
            .map(|segment| async move { (*segment, tasks.translate(segment).await) })
            .collect();
        let outputs = run_stage(
            WorkflowStage::Translate,
            futures,
            self.settings.concurrency.translation,
            &mut state.progress,
        )
        .await;

        for (segment, output) in outputs {
            self.record_translation(state, segment, output, "Translation");
        }
        self.flush_cache();
    }

    async fn repair_stage(&self, tasks: &WorkflowTasks<'_>, segments: &[Segment], state: &mut RunState<'_>) {
        let failed: Vec<&Segment> = segments
            .iter()
            .filter(|segment| state.results.get(&segment.id).is_some_and(WorkflowResult::needs_repair))
            .collect();

        if failed.is_empty() {
            state.progress.start(WorkflowStage::Repair, "No translations to repair");
            return;
        }

        info!("Repairing {} translations that echo their source", failed.len());
        state.progress.start(WorkflowStage::Repair, "Repairing failed translations...");
        let futures: Vec<_> = failed
            .iter()
            .map(|segment| async move { (*segment, tasks.translate(segment).await) })
            .collect();
        let outputs = run_stage(
            WorkflowStage::Repair,
            futures,
            self.settings.concurrency.translation,
            &mut state.progress,
        )
        .await;

        for (segment, output) in outputs {
            self.record_translation(state, segment, output, "Repair");
        }
        self.flush_cache();
    }

    fn record_translation(
        &self,
        state: &mut RunState<'_>,
        segment: &Segment,
        output: Result<TaskOutput<String>, crate::errors::ProviderError>,
        stage: &str,
    ) {
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                error!("{} failed for {}: {}", stage, segment.id, e);
                return;
            }
        };

        state.usage.record(UsageStage::Translation, &output.usage);
        if output.value.trim() != segment.original_text.trim() {
            self.cache.put(&segment.original_text, state.source_language, state.target_language, &output.value);
        }

        if let Some(result) = state.results.get_mut(&segment.id) {
            result.translation_a = Some(output.value);
            result.translation_a_prompt = Some(output.prompt);
            result.translation_a_raw_response = Some(output.raw_response);
        }
    }

    async fn evaluate_stage(&self, tasks: &WorkflowTasks<'_>, segments: &[Segment], state: &mut RunState<'_>) {
        state.progress.start(WorkflowStage::Evaluate1, "Starting evaluation...");
        let bypass = same_language(state.source_language, state.target_language);

        let mut pending = Vec::new();
        for segment in segments {
            let Some(result) = state.results.get_mut(&segment.id) else { continue };

            if result.is_simple() {
                result.eval_a = Some(EvaluationResult::perfect(SIMPLE_SEGMENT_NOTE));
                continue;
            }
            if bypass {
                result.eval_a = Some(EvaluationResult::perfect(SAME_LANGUAGE_NOTE));
                continue;
            }
            match &result.translation_a {
                Some(translation) => pending.push((segment, translation.clone())),
                None => debug!("No translation to evaluate for {}", segment.id),
            }
        }

        let futures: Vec<_> = pending
            .iter()
            .map(|(segment, translation)| async move { (*segment, tasks.evaluate(segment, translation).await) })
            .collect();
        let outputs = run_stage(
            WorkflowStage::Evaluate1,
            futures,
            self.settings.concurrency.evaluation_1,
            &mut state.progress,
        )
        .await;

        for (segment, output) in outputs {
            match output {
                Ok(output) => {
                    state.usage.record(UsageStage::Evaluation1, &output.usage);
                    if let Some(result) = state.results.get_mut(&segment.id) {
                        result.eval_a = Some(output.value);
                        result.eval_a_prompt = Some(output.prompt);
                        result.eval_a_raw_response = Some(output.raw_response);
                    }
                }
                Err(e) => error!("Evaluation 1 failed for {}: {}", segment.id, e),
            }
        }
    }

    async fn optimize_stage(&self, tasks: &WorkflowTasks<'_>, segments: &[Segment], state: &mut RunState<'_>) {
        state.progress.start(WorkflowStage::Optimize, "Starting optimization...");
        let threshold = self.settings.optimization_threshold;

        let mut pending = Vec::new();
        for segment in segments {
            let Some(result) = state.results.get_mut(&segment.id) else { continue };
            let Some(translation) = result.translation_a.clone() else { continue };

            let good_enough = result
                .eval_a
                .as_ref()
                .is_some_and(|evaluation| evaluation.total_score() >= threshold);
            if result.is_simple() || good_enough {
                result.translation_c = Some(translation);
                continue;
            }

            let suggestions = result
                .eval_a
                .as_ref()
                .map(|evaluation| evaluation.suggestions.clone())
                .unwrap_or_default();
            pending.push((segment, translation, suggestions));
        }

        debug!("Optimizing {} translations below {:.1}", pending.len(), threshold);
        let futures: Vec<_> = pending
            .iter()
            .map(|(segment, translation, suggestions)| async move {
                (*segment, tasks.optimize(segment, translation, suggestions).await)
            })
            .collect();
        let outputs = run_stage(
            WorkflowStage::Optimize,
            futures,
            self.settings.concurrency.optimization,
            &mut state.progress,
        )
        .await;

        for (segment, output) in outputs {
            match output {
                Ok(output) => {
                    state.usage.record(UsageStage::Optimization, &output.usage);
                    if let Some(result) = state.results.get_mut(&segment.id) {
                        result.translation_c = Some(output.value);
                        result.translation_c_prompt = Some(output.prompt);
                        result.translation_c_raw_response = Some(output.raw_response);
                    }
                }
                Err(e) => error!("Optimization failed for {}: {}", segment.id, e),
            }
        }
    }

    async fn compare_stage(&self, tasks: &WorkflowTasks<'_>, segments: &[Segment], state: &mut RunState<'_>) {
        state.progress.start(WorkflowStage::Evaluate2, "Starting comparative evaluation...");

        let mut pending = Vec::new();
        for segment in segments {
            let Some(result) = state.results.get_mut(&segment.id) else { continue };

            if result.is_simple() {
                result.eval_c = Some(EvaluationResult::perfect(SIMPLE_SEGMENT_NOTE));
                continue;
            }
            if result.translation_c == result.translation_a {
                result.eval_c = result.eval_a.clone();
                continue;
            }
            if let (Some(a), Some(c)) = (&result.translation_a, &result.translation_c) {
                pending.push((segment, a.clone(), c.clone()));
            }
        }

        let futures: Vec<_> = pending
            .iter()
            .map(|(segment, a, c)| async move { (*segment, tasks.compare(segment, a, c).await) })
            .collect();
        let outputs = run_stage(
            WorkflowStage::Evaluate2,
            futures,
            self.settings.concurrency.evaluation_2,
            &mut state.progress,
        )
        .await;

        for (segment, output) in outputs {
            match output {
                Ok(output) => {
                    state.usage.record(UsageStage::Evaluation2, &output.usage);
                    let (eval_a, eval_c) = output.value;
                    if let Some(result) = state.results.get_mut(&segment.id) {
                        result.eval_a = Some(eval_a);
                        result.eval_c = Some(eval_c);
                        result.eval_c_prompt = Some(output.prompt);
                        result.eval_c_raw_response = Some(output.raw_response);
                    }
                }
                Err(e) => error!("Comparative evaluation failed for {}: {}", segment.id, e),
            }
        }
    }

    fn select_stage(segments: &[Segment], mut state: RunState<'_>) -> WorkflowOutcome {
        state.progress.start(WorkflowStage::Select, "Finalizing...");

        let results = segments
            .iter()
            .filter_map(|segment| state.results.remove(&segment.id))
            .map(|mut result| {
                result.select();
                result
            })
            .collect();

        state.progress.finish();
        WorkflowOutcome { results, usage: state.usage }
    }

    fn flush_cache(&self) {
        if let Err(e) = self.cache.flush() {
            warn!("Failed to save translation cache: {}", e);
        }
    }
}

/// Drive one stage's futures, reporting progress per completion
async fn run_stage<T, Fut>(
    stage: WorkflowStage,
    futures: Vec<Fut>,
    limit: usize,
    progress: &mut WorkflowProgress,
) -> Vec<T>
where
    Fut: Future<Output = T>,
{
    run_bounded(futures, limit, |_, completed, total| progress.advance(stage, completed, total)).await
}
