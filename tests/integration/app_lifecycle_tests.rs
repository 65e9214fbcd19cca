/*!
 * Full app lifecycle tests: controller runs with the offline mock models
 */

use std::path::Path;

use docufluent::app_config::Config;
use docufluent::app_controller::Controller;
use docufluent::document::Document;
use docufluent::file_utils::{FileManager, OutputKind};
use docufluent::providers::mock::{MOCK_OPTIMIZATION, MOCK_TRANSLATION};
use docufluent::translation::{SelectedModel, WorkflowResult};

use crate::common::{create_temp_dir, create_test_file, init_logging, sample_document, write_document};

fn offline_config(dir: &Path) -> Config {
    let mut config = Config::offline();
    config.cache.path = dir.join("cache.json").to_string_lossy().to_string();
    config.retry.delay_ms = 0;
    config
}

fn translated_result(segment_id: &str, original: &str, translation: &str) -> WorkflowResult {
    let mut result = WorkflowResult::new(segment_id, original);
    result.translation_a = Some(translation.to_string());
    result.select();
    result
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&FileManager::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_run_withOfflineModels_shouldWriteAllOutputs() {
    init_logging();
    let dir = create_temp_dir().unwrap();
    let input = write_document(dir.path(), "manual.json", &sample_document()).unwrap();
    let output_dir = dir.path().join("out");
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let outcome = controller
        .run(input.clone(), output_dir.clone(), false)
        .await
        .unwrap()
        .expect("first run should translate");

    for kind in OutputKind::ALL {
        let path = FileManager::generate_output_path(&input, &output_dir, kind);
        assert!(FileManager::file_exists(&path), "missing {:?}", path);
    }

    // mock comparative scores favour the optimized translation
    assert_eq!(outcome.count(SelectedModel::Optimized), 5);
    assert_eq!(outcome.count(SelectedModel::SkippedSimple), 1);

    let translated = Document::load(FileManager::generate_output_path(&input, &output_dir, OutputKind::Translated)).unwrap();
    assert_eq!(translated.body.paragraphs[0].text(), MOCK_OPTIMIZATION);
    assert_eq!(translated.body.paragraphs[1].text(), "12.5 %");
    assert_eq!(translated.stories[0].paragraphs[0].text(), MOCK_OPTIMIZATION);

    let bilingual = Document::load(FileManager::generate_output_path(&input, &output_dir, OutputKind::Bilingual)).unwrap();
    assert_eq!(
        bilingual.body.paragraphs[0].text(),
        format!("Pump pressure rises.\n{}", MOCK_OPTIMIZATION)
    );

    let mapping = read_json(&FileManager::generate_output_path(&input, &output_dir, OutputKind::ModelMapping));
    assert_eq!(mapping["Model A"], "mock-translator");
    assert_eq!(mapping["Model B"], "mock-evaluator");
    assert_eq!(mapping["Model C"], "mock-optimizer");

    let results = read_json(&FileManager::generate_output_path(&input, &output_dir, OutputKind::Results));
    assert_eq!(results.as_array().map(Vec::len), Some(6));
    assert_eq!(results[0]["segment_id"], "p_0");
    assert_eq!(results[0]["translation_a"], MOCK_TRANSLATION);

    let usage = read_json(&FileManager::generate_output_path(&input, &output_dir, OutputKind::Usage));
    // 20 model calls at 20 tokens each
    assert_eq!(usage["total"]["total_tokens"], 400);
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let dir = create_temp_dir().unwrap();
    let input = write_document(dir.path(), "manual.json", &sample_document()).unwrap();
    let output_dir = dir.path().to_path_buf();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    assert!(controller.run(input.clone(), output_dir.clone(), false).await.unwrap().is_some());
    assert!(controller.run(input.clone(), output_dir.clone(), false).await.unwrap().is_none());

    let forced = controller.run(input.clone(), output_dir, true).await.unwrap().unwrap();
    // translations now come from the cache written by the first run
    assert!(forced.results.iter().filter(|r| !r.is_simple()).all(|r| r.from_cache));
}

#[tokio::test]
async fn test_reconstruct_fromSavedResults_shouldReproduceDocuments() {
    let dir = create_temp_dir().unwrap();
    let input = write_document(dir.path(), "manual.json", &sample_document()).unwrap();
    let output_dir = dir.path().join("out");
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();
    controller.run(input.clone(), output_dir.clone(), false).await.unwrap();

    let translated_path = FileManager::generate_output_path(&input, &output_dir, OutputKind::Translated);
    let bilingual_path = FileManager::generate_output_path(&input, &output_dir, OutputKind::Bilingual);
    let results_path = FileManager::generate_output_path(&input, &output_dir, OutputKind::Results);
    let translated = std::fs::read(&translated_path).unwrap();
    let bilingual = std::fs::read(&bilingual_path).unwrap();
    std::fs::remove_file(&translated_path).unwrap();
    std::fs::remove_file(&bilingual_path).unwrap();

    let outcome = controller
        .reconstruct(input.clone(), results_path, output_dir.clone(), false)
        .unwrap()
        .expect("outputs were removed");

    assert_eq!(outcome.results.len(), 6);
    assert_eq!(std::fs::read(&translated_path).unwrap(), translated);
    assert_eq!(std::fs::read(&bilingual_path).unwrap(), bilingual);
}

#[test]
fn test_reconstruct_withExistingOutput_shouldSkipUnlessForced() {
    let dir = create_temp_dir().unwrap();
    let input = write_document(dir.path(), "manual.json", &sample_document()).unwrap();
    let results = create_test_file(
        dir.path(),
        "manual_results.json",
        &serde_json::to_string(&[translated_result("p_0", "Pump pressure rises.", "泵压升高。")]).unwrap(),
    )
    .unwrap();
    let output_dir = dir.path().to_path_buf();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    assert!(controller.reconstruct(input.clone(), results.clone(), output_dir.clone(), false).unwrap().is_some());
    assert!(controller.reconstruct(input.clone(), results.clone(), output_dir.clone(), false).unwrap().is_none());
    assert!(controller.reconstruct(input.clone(), results, output_dir.clone(), true).unwrap().is_some());

    let translated = Document::load(FileManager::generate_output_path(&input, &output_dir, OutputKind::Translated)).unwrap();
    assert_eq!(translated.body.paragraphs[0].text(), "泵压升高。");
    // segments without a result keep their text
    assert_eq!(translated.body.tables[0].cells[0].paragraphs[0].text(), "Valve");
}

#[test]
fn test_reconstruct_withMalformedResults_shouldFailWithContext() {
    let dir = create_temp_dir().unwrap();
    let input = write_document(dir.path(), "manual.json", &sample_document()).unwrap();
    let results = create_test_file(dir.path(), "manual_results.json", "{\"segment_id\": 1}").unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let error = controller
        .reconstruct(input, results, dir.path().join("out"), false)
        .unwrap_err();

    assert!(error.to_string().contains("Failed to parse results file"));
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let result = controller
        .run(dir.path().join("absent.json"), dir.path().to_path_buf(), false)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_withInvalidDocument_shouldFailWithContext() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "broken.json", "{\"body\": 42}").unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let error = controller
        .run(input, dir.path().to_path_buf(), false)
        .await
        .unwrap_err();

    assert!(error.to_string().contains("Failed to load document"));
}

#[tokio::test]
async fn test_withConfig_withGlossaryFile_shouldLoadTerms() {
    let dir = create_temp_dir().unwrap();
    let glossary = create_test_file(dir.path(), "terms.txt", "pump -> 泵\nvalve -> 阀门\n").unwrap();
    let mut config = offline_config(dir.path());
    config.glossary_path = Some(glossary.to_string_lossy().to_string());

    let controller = Controller::with_config(config).unwrap();

    assert_eq!(controller.glossary().len(), 2);
}
