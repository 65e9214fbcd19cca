/*!
 * Integration tests for the five-stage workflow.
 *
 * Every run goes through `TranslationWorkflow::run` with scripted models, so
 * the assertions cover stage gating, selection, caching and usage together.
 */

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use docufluent::app_config::StageConcurrency;
use docufluent::document::{extract, Segment};
use docufluent::errors::ProviderError;
use docufluent::translation::{
    ProgressCallback, RetryPolicy, SelectedModel, TranslationCache, TranslationWorkflow,
    WorkflowOutcome, WorkflowSettings,
};
use docufluent::translation::pipeline::result::SIMPLE_SEGMENT_NOTE;

use crate::common::scripted_model::{comparative_json, evaluation_json};
use crate::common::{create_temp_dir, init_logging, sample_document, Role, ScriptedModel};

fn fast_settings() -> WorkflowSettings {
    WorkflowSettings {
        concurrency: StageConcurrency::uniform(4),
        retry: RetryPolicy::immediate(2),
        ..WorkflowSettings::default()
    }
}

fn workflow_with(model: &ScriptedModel) -> TranslationWorkflow {
    TranslationWorkflow::new(
        Arc::new(model.clone()),
        Arc::new(model.clone()),
        Arc::new(model.clone()),
    )
    .with_settings(fast_settings())
}

fn segments() -> Vec<Segment> {
    extract(&sample_document())
}

async fn run(workflow: &TranslationWorkflow, segments: &[Segment]) -> WorkflowOutcome {
    workflow.run(segments, "auto", "Chinese", None).await
}

#[tokio::test]
async fn test_run_withBetterOptimization_shouldSelectOptimized() {
    init_logging();
    let model = ScriptedModel::standard("scripted", 8, 9);
    let segments = segments();

    let outcome = run(&workflow_with(&model), &segments).await;

    assert_eq!(outcome.results.len(), segments.len());
    let first = &outcome.results[0];
    assert_eq!(first.segment_id, "p_0");
    assert_eq!(first.translation_a.as_deref(), Some("ZH:Pump pressure rises."));
    assert_eq!(first.translation_c.as_deref(), Some("优化译文"));
    assert_eq!(first.selected_model, SelectedModel::Optimized);
    assert_eq!(first.final_translation, "优化译文");
    assert!((first.score() - 9.0).abs() < 1e-6);

    // five translatable segments, one simple
    assert_eq!(model.calls(Role::Translate), 5);
    assert_eq!(model.calls(Role::Evaluate), 5);
    assert_eq!(model.calls(Role::Optimize), 5);
    assert_eq!(model.calls(Role::Compare), 5);
    assert_eq!(outcome.usage.total.total_tokens, 20 * 10);
    assert_eq!(outcome.usage.stages.optimization.prompt_tokens, 25);
}

#[tokio::test]
async fn test_run_withSimpleSegment_shouldNeverCallModels() {
    let model = ScriptedModel::standard("scripted", 8, 9);
    let segments: Vec<Segment> = segments().into_iter().filter(|s| s.id == "p_1").collect();

    let outcome = run(&workflow_with(&model), &segments).await;

    assert_eq!(model.total_calls(), 0);
    let result = &outcome.results[0];
    assert_eq!(result.selected_model, SelectedModel::SkippedSimple);
    assert_eq!(result.final_translation, "12.5 %");
    assert_eq!(result.eval_a.as_ref().map(|e| e.total_score()), Some(10.0));
    assert_eq!(result.eval_c.as_ref().map(|e| e.total_score()), Some(10.0));
    assert_eq!(result.eval_a.as_ref().map(|e| e.suggestions.as_str()), Some(SIMPLE_SEGMENT_NOTE));
    assert_eq!(result.eval_c.as_ref().map(|e| e.suggestions.as_str()), Some(SIMPLE_SEGMENT_NOTE));
    assert_eq!(outcome.usage.total.total_tokens, 0);
}

#[tokio::test]
async fn test_run_withTiedComparison_shouldKeepInitialTranslation() {
    let model = ScriptedModel::standard("scripted", 8, 8);
    let segments = segments();

    let outcome = run(&workflow_with(&model), &segments).await;

    let result = outcome.results.iter().find(|r| r.segment_id == "t_0_r_0_c_0_p_0").unwrap();
    assert_eq!(result.selected_model, SelectedModel::Initial);
    assert_eq!(result.final_translation, "ZH:Valve");
    assert_eq!(outcome.count(SelectedModel::Optimized), 0);
}

#[tokio::test]
async fn test_run_withScoreAtThreshold_shouldSkipOptimization() {
    let model = ScriptedModel::new("scripted", |role, prompt| {
        Ok(match role {
            Role::Translate => format!("ZH:{}", prompt),
            Role::Evaluate => r#"{"accuracy": 10, "fluency": 10, "consistency": 9, "terminology": 9, "completeness": 10, "suggestions": ""}"#.to_string(),
            Role::Optimize | Role::Compare => unreachable!("optimization must be skipped"),
        })
    });
    let segments = segments();
    let workflow = workflow_with(&model).with_settings(WorkflowSettings {
        optimization_threshold: 9.6,
        ..fast_settings()
    });

    let outcome = run(&workflow, &segments).await;

    assert_eq!(model.calls(Role::Optimize), 0);
    assert_eq!(model.calls(Role::Compare), 0);
    for result in outcome.results.iter().filter(|r| !r.is_simple()) {
        assert_eq!(result.translation_c, result.translation_a);
        assert_eq!(result.eval_c, result.eval_a);
        assert_eq!(result.selected_model, SelectedModel::Initial);
    }
}

#[tokio::test]
async fn test_run_withSameLanguage_shouldBypassFirstEvaluation() {
    let model = ScriptedModel::standard("scripted", 3, 3);
    let segments = segments();

    let outcome = workflow_with(&model)
        .run(&segments, "en", "English", None)
        .await;

    assert_eq!(model.calls(Role::Evaluate), 0);
    assert_eq!(model.calls(Role::Optimize), 0);
    let result = &outcome.results[0];
    assert_eq!(result.eval_a.as_ref().map(|e| e.total_score()), Some(10.0));
    assert_eq!(result.final_translation, "ZH:Pump pressure rises.");
}

#[tokio::test]
async fn test_run_withEchoedTranslation_shouldRepairOnce() {
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let model = ScriptedModel::new("scripted", move |role, prompt| {
        Ok(match role {
            // echo the first time each text is seen
            Role::Translate if seen.lock().insert(prompt.to_string()) => prompt.to_string(),
            Role::Translate => format!("修复:{}", prompt),
            Role::Evaluate => evaluation_json(8, "ok"),
            Role::Optimize => "优化译文".to_string(),
            Role::Compare => comparative_json(9, 7),
        })
    });
    let segments = segments();

    let outcome = run(&workflow_with(&model), &segments).await;

    assert_eq!(model.calls(Role::Translate), 10);
    let result = &outcome.results[0];
    assert_eq!(result.translation_a.as_deref(), Some("修复:Pump pressure rises."));
    assert_eq!(result.selected_model, SelectedModel::Initial);
    assert_eq!(result.final_translation, "修复:Pump pressure rises.");
    // repair tokens count as translation
    assert_eq!(outcome.usage.stages.translation.total_tokens, 100);
}

#[tokio::test]
async fn test_run_withFailingTranslator_shouldFallBackToOriginal() {
    init_logging();
    let model = ScriptedModel::new("scripted", |role, _| match role {
        Role::Translate => Err(ProviderError::ConnectionError("connection refused".to_string())),
        _ => unreachable!("nothing to evaluate without a translation"),
    });
    let segments = segments();

    let outcome = run(&workflow_with(&model), &segments).await;

    assert_eq!(outcome.results.len(), segments.len());
    // two attempts per translatable segment, no repair of missing translations
    assert_eq!(model.calls(Role::Translate), 10);
    for (result, segment) in outcome.results.iter().zip(&segments) {
        assert_eq!(result.final_translation, segment.original_text);
        if !result.is_simple() {
            assert_eq!(result.translation_a, None);
            assert_eq!(result.selected_model, SelectedModel::Initial);
            assert_eq!(result.score(), 0.0);
        }
    }
    assert_eq!(outcome.usage.total.total_tokens, 0);
}

#[tokio::test]
async fn test_run_withUnparsableEvaluation_shouldScoreZeroAndOptimize() {
    let model = ScriptedModel::new("scripted", |role, prompt| {
        Ok(match role {
            Role::Translate => format!("ZH:{}", prompt),
            Role::Evaluate => "I cannot grade this".to_string(),
            Role::Optimize => "优化译文".to_string(),
            Role::Compare => "still no json".to_string(),
        })
    });
    let segments = segments();

    let outcome = run(&workflow_with(&model), &segments).await;

    let result = &outcome.results[0];
    assert_eq!(model.calls(Role::Optimize), 5);
    assert_eq!(result.eval_a.as_ref().map(|e| e.total_score()), Some(0.0));
    assert_eq!(result.eval_c.as_ref().map(|e| e.suggestions.as_str()), Some("still no json"));
    // zero against zero is a tie
    assert_eq!(result.selected_model, SelectedModel::Initial);
}

#[tokio::test]
async fn test_run_secondRun_shouldServeTranslationsFromCache() {
    let dir = create_temp_dir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let segments = segments();

    let first = ScriptedModel::standard("first", 8, 8);
    workflow_with(&first)
        .with_cache(TranslationCache::load(&cache_path, true))
        .run(&segments, "auto", "Chinese", None)
        .await;
    assert!(cache_path.exists());

    let second = ScriptedModel::standard("second", 8, 8);
    let outcome = workflow_with(&second)
        .with_cache(TranslationCache::load(&cache_path, true))
        .run(&segments, "auto", "Chinese", None)
        .await;

    assert_eq!(second.calls(Role::Translate), 0);
    assert_eq!(second.calls(Role::Evaluate), 5);
    let result = &outcome.results[0];
    // Select replaces the Cached tag with A or C; from_cache keeps the cache hit visible
    assert!(result.from_cache);
    assert_eq!(result.translation_a.as_deref(), Some("ZH:Pump pressure rises."));
    assert_eq!(result.translation_a_prompt, None);
    assert_ne!(result.selected_model, SelectedModel::Cached);
    assert!(!outcome.results[1].from_cache);
}

#[tokio::test]
async fn test_run_withEchoedCacheEntry_shouldTranslateAndCountMiss() {
    let model = ScriptedModel::standard("scripted", 8, 8);
    let cache = TranslationCache::new(true);
    cache.put("Pump pressure rises.", "auto", "Chinese", "Pump pressure rises.");
    let workflow = workflow_with(&model).with_cache(cache);

    let outcome = run(&workflow, &segments()).await;

    assert_eq!(model.calls(Role::Translate), 5);
    assert!(!outcome.results[0].from_cache);
    assert_eq!(outcome.results[0].translation_a.as_deref(), Some("ZH:Pump pressure rises."));
    let (hits, misses, _) = workflow.cache().stats();
    assert_eq!((hits, misses), (0, 5));
}

#[tokio::test]
async fn test_run_withEchoedTranslation_shouldNotCacheIt() {
    let dir = create_temp_dir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let model = ScriptedModel::new("echo", |role, prompt| {
        Ok(match role {
            Role::Translate => prompt.to_string(),
            Role::Evaluate => evaluation_json(10, ""),
            Role::Optimize | Role::Compare => unreachable!("perfect scores skip optimization"),
        })
    });
    let workflow = workflow_with(&model).with_cache(TranslationCache::load(&cache_path, true));

    workflow.run(&segments(), "auto", "Chinese", None).await;

    assert!(workflow.cache().is_empty());
}

type ProgressLog = Arc<Mutex<Vec<(f32, String)>>>;

fn recording_callback() -> (ProgressCallback, ProgressLog) {
    let reports: ProgressLog = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let callback: ProgressCallback = Arc::new(move |fraction, description| {
        sink.lock().push((fraction, description.to_string()));
    });
    (callback, reports)
}

/// Assert each `(fraction, description)` stage start was reported, in order
fn assert_stage_starts(reports: &[(f32, String)], expected: &[(f32, &str)]) {
    let mut last_index = None;
    for (milestone, description) in expected {
        let index = reports
            .iter()
            .position(|(_, reported)| reported == description)
            .unwrap_or_else(|| panic!("no report for '{}'", description));
        assert!(
            (reports[index].0 - milestone).abs() < 1e-5,
            "'{}' reported at {} instead of {}",
            description,
            reports[index].0,
            milestone
        );
        assert!(last_index < Some(index), "'{}' reported out of order", description);
        last_index = Some(index);
    }
}

#[tokio::test]
async fn test_run_withProgressCallback_shouldReportMonotonicallyToCompletion() {
    let (callback, reports) = recording_callback();
    let model = ScriptedModel::standard("scripted", 8, 9);
    let segments = segments();

    workflow_with(&model)
        .run(&segments, "auto", "Chinese", Some(callback))
        .await;

    let reports = reports.lock();
    assert!(reports.len() > 6);
    assert!(reports.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert!(reports.iter().all(|(fraction, _)| (0.0..=1.0).contains(fraction)));
    assert_eq!(reports.last().map(|(fraction, _)| *fraction), Some(1.0));
}

#[tokio::test]
async fn test_run_withProgressCallback_shouldStartEachStageAtItsMilestone() {
    let (callback, reports) = recording_callback();
    let model = ScriptedModel::standard("scripted", 8, 9);
    let segments = segments();

    workflow_with(&model)
        .run(&segments, "auto", "Chinese", Some(callback))
        .await;

    assert_stage_starts(
        &reports.lock(),
        &[
            (0.0, "Starting translation..."),
            (0.3, "No translations to repair"),
            (0.35, "Starting evaluation..."),
            (0.55, "Starting optimization..."),
            (0.75, "Starting comparative evaluation..."),
            (0.95, "Finalizing..."),
            (1.0, "Done"),
        ],
    );
}

#[tokio::test]
async fn test_run_withEchoedTranslation_shouldReportRepairAtItsMilestone() {
    let (callback, reports) = recording_callback();
    let model = ScriptedModel::new("scripted", |role, prompt| {
        Ok(match role {
            Role::Translate => prompt.to_string(),
            Role::Evaluate => evaluation_json(10, ""),
            Role::Optimize | Role::Compare => unreachable!("perfect scores skip optimization"),
        })
    });
    let segments = segments();

    workflow_with(&model)
        .run(&segments, "auto", "Chinese", Some(callback))
        .await;

    let reports = reports.lock();
    assert_stage_starts(
        &reports,
        &[
            (0.0, "Starting translation..."),
            (0.3, "Repairing failed translations..."),
            (0.35, "Starting evaluation..."),
        ],
    );
    assert!(reports.iter().any(|(_, description)| description == "Repairing 5/5"));
}

#[tokio::test]
async fn test_run_withEmptyInput_shouldReturnEmptyOutcome() {
    let model = ScriptedModel::standard("scripted", 8, 9);

    let outcome = run(&workflow_with(&model), &[]).await;

    assert!(outcome.results.is_empty());
    assert_eq!(model.total_calls(), 0);
    assert_eq!(outcome.usage.total.total_tokens, 0);
}
