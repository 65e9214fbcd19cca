/*!
 * Tests for components that read or write side files
 */

use std::path::Path;

use docufluent::app_config::{Config, ProviderKind};
use docufluent::file_utils::{FileManager, OutputKind};
use docufluent::translation::{Glossary, TranslationCache};

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_glossaryLoad_withMixedFormats_shouldCollectAllPairs() {
    let dir = create_temp_dir().unwrap();
    let content = "# Pump terms\n| English | Russian |\n|---|---|\n| pump | насос |\n\nvalve -> клапан\nseal\tуплотнение\n";
    let path = create_test_file(dir.path(), "glossary.md", content).unwrap();

    let glossary = Glossary::load(&path).unwrap();

    assert_eq!(glossary.len(), 3);
    assert_eq!(
        glossary.to_prompt_block(),
        "pump -> насос\nvalve -> клапан\nseal -> уплотнение"
    );
}

#[test]
fn test_glossaryLoad_withMissingFile_shouldFail() {
    assert!(Glossary::load("/definitely/not/here.md").is_err());
}

#[test]
fn test_translationCache_flushThenLoad_shouldRestoreEntries() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = TranslationCache::load(&path, true);
    assert!(cache.is_empty());
    cache.put("Hello", "auto", "Chinese", "你好");
    cache.flush().unwrap();

    let reloaded = TranslationCache::load(&path, true);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get("Hello", "auto", "Chinese").as_deref(), Some("你好"));
    assert_eq!(reloaded.get("Hello", "auto", "Russian"), None);
}

#[test]
fn test_translationCache_withCorruptFile_shouldStartEmpty() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "cache.json", "{not json").unwrap();

    let cache = TranslationCache::load(&path, true);

    assert!(cache.is_empty());
    cache.put("a", "auto", "Chinese", "甲");
    cache.flush().unwrap();
    assert_eq!(TranslationCache::load(&path, true).len(), 1);
}

#[test]
fn test_translationCache_whenDisabled_shouldNeitherReadNorWrite() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = TranslationCache::load(&path, false);
    cache.put("Hello", "auto", "Chinese", "你好");
    cache.flush().unwrap();

    assert_eq!(cache.get("Hello", "auto", "Chinese"), None);
    assert!(!path.exists());
}

#[test]
fn test_configFile_withPartialJson_shouldFillDefaults() {
    let config: Config = serde_json::from_str(
        r#"{"target_language": "ru", "translation": {"provider": "mock", "model": "m"}}"#,
    )
    .unwrap();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "ru");
    assert_eq!(config.translation.provider, ProviderKind::Mock);
    assert_eq!(config.translation.model, "m");
    assert_eq!(config.concurrency.translation, 32);
    assert_eq!(config.retry.max_attempts, 3);
    assert!((config.optimization_threshold - 9.5).abs() < f32::EPSILON);
}

#[test]
fn test_configFile_roundTrip_shouldValidateOfflineConfig() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    FileManager::write_json(&path, &Config::offline()).unwrap();

    let content = FileManager::read_to_string(&path).unwrap();
    let config: Config = serde_json::from_str(&content).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.evaluation.model, "mock-evaluator");
}

#[test]
fn test_generateOutputPath_shouldUseStemAndSuffix() {
    let paths: Vec<String> = OutputKind::ALL
        .iter()
        .map(|kind| {
            FileManager::generate_output_path("/docs/report.json", Path::new("/out"), *kind)
                .to_string_lossy()
                .to_string()
        })
        .collect();

    assert_eq!(
        paths,
        vec![
            "/out/report_translated.json",
            "/out/report_bilingual.json",
            "/out/report_usage.json",
            "/out/report_results.json",
            "/out/report_model_mapping.json",
        ]
    );
}
