use anyhow::{Result, Context, anyhow};
use log::{warn, info, debug};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::document::{extract, Document, Reconstructor, Segment};
use crate::file_utils::{FileManager, OutputKind};
use crate::providers::{create_model, LanguageModel};
use crate::translation::{
    Glossary, TranslationCache, TranslationWorkflow, UsageReport, WorkflowOutcome, WorkflowResult, WorkflowSettings,
};
use crate::translation::pipeline::ProgressCallback;

// @module: Application controller for document translation

/// Resolution of the progress bar, in steps over the whole workflow
const PROGRESS_STEPS: u64 = 1000;

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Glossary loaded from the configured file
    glossary: Glossary,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let glossary = match &config.glossary_path {
            Some(path) => {
                let glossary = Glossary::load(path)
                    .with_context(|| format!("Failed to load glossary: {}", path))?;
                info!("Loaded {} glossary terms from {}", glossary.len(), path);
                glossary
            }
            None => Glossary::default(),
        };

        Ok(Self { config, glossary })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Translate `input_file` and write every output artifact into `output_dir`.
    ///
    /// Returns `None` when the translated document already exists and
    /// `force_overwrite` is not set.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<WorkflowOutcome>> {
        let start_time = std::time::Instant::now();

        // Check if the input file exists
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(&output_dir)?;

        let translated_path = FileManager::generate_output_path(&input_file, &output_dir, OutputKind::Translated);
        if translated_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let document = Document::load(&input_file)
            .with_context(|| format!("Failed to load document: {:?}", input_file))?;
        let segments = extract(&document);
        info!("Extracted {} segments from {:?}", segments.len(), input_file);

        let workflow = self.build_workflow()?;
        let progress_bar = Self::progress_bar();
        let outcome = workflow
            .run(
                &segments,
                &self.config.source_language,
                &self.config.target_language,
                Some(Self::progress_callback(progress_bar.clone())),
            )
            .await;
        progress_bar.finish_and_clear();

        let (translated, bilingual) = Self::render_documents(document, &segments, &outcome)?;

        self.write_outputs(&input_file, &output_dir, &translated, &bilingual, &outcome, &workflow)?;

        info!(
            "Translation completed in {}.",
            Self::format_duration(start_time.elapsed())
        );
        info!("Success: {}", translated_path.display());

        Ok(Some(outcome))
    }

    /// Rebuild the translated and bilingual documents from a saved results file.
    ///
    /// No model is called; `results_file` is the `_results.json` written by
    /// an earlier run over the same input. Returns `None` when the translated
    /// document already exists and `force_overwrite` is not set.
    pub fn reconstruct(
        &self,
        input_file: PathBuf,
        results_file: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<Option<WorkflowOutcome>> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(&output_dir)?;

        let translated_path = FileManager::generate_output_path(&input_file, &output_dir, OutputKind::Translated);
        if translated_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let document = Document::load(&input_file)
            .with_context(|| format!("Failed to load document: {:?}", input_file))?;
        let segments = extract(&document);

        let content = FileManager::read_to_string(&results_file)?;
        let results: Vec<WorkflowResult> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {:?}", results_file))?;

        let known: HashSet<&str> = segments.iter().map(|segment| segment.id.as_str()).collect();
        let unknown = results
            .iter()
            .filter(|result| !known.contains(result.segment_id.as_str()))
            .count();
        if unknown > 0 {
            warn!("{} results do not match any segment of {:?} and are ignored", unknown, input_file);
        }
        info!("Loaded {} results for {} segments", results.len(), segments.len());

        let outcome = WorkflowOutcome { results, usage: UsageReport::default() };
        let (translated, bilingual) = Self::render_documents(document, &segments, &outcome)?;

        translated.save(&translated_path)
            .context("Failed to save translated document")?;
        bilingual.save(FileManager::generate_output_path(&input_file, &output_dir, OutputKind::Bilingual))
            .context("Failed to save bilingual document")?;

        info!("Success: {}", translated_path.display());
        Ok(Some(outcome))
    }

    /// Translated and bilingual documents for `outcome`
    fn render_documents(document: Document, segments: &[Segment], outcome: &WorkflowOutcome) -> Result<(Document, Document)> {
        // Bilingual rendering reads the untouched source, so it runs first
        let reconstructor = Reconstructor::new(segments);
        let bilingual = reconstructor
            .render_bilingual(&document, &outcome.bilingual_entries())
            .context("Failed to render bilingual document")?;
        let mut translated = document;
        let applied = reconstructor
            .apply_translations(&mut translated, &outcome.final_translations())
            .context("Failed to apply translations")?;
        debug!("Rewrote {} paragraphs", applied);

        Ok((translated, bilingual))
    }

    fn build_workflow(&self) -> Result<TranslationWorkflow> {
        let translator = create_model(&self.config.translation).context("Failed to create translation model")?;
        let evaluator = create_model(&self.config.evaluation).context("Failed to create evaluation model")?;
        let optimizer = create_model(&self.config.optimization).context("Failed to create optimization model")?;
        info!(
            "Models: translator {} ({}), evaluator {} ({}), optimizer {} ({})",
            translator.model_name(),
            self.config.translation.provider.display_name(),
            evaluator.model_name(),
            self.config.evaluation.provider.display_name(),
            optimizer.model_name(),
            self.config.optimization.provider.display_name(),
        );

        let cache = TranslationCache::load(&self.config.cache.path, self.config.cache.enabled);
        Ok(TranslationWorkflow::new(translator, evaluator, optimizer)
            .with_settings(WorkflowSettings::from_config(&self.config))
            .with_glossary(self.glossary.clone())
            .with_cache(cache))
    }

    fn write_outputs(
        &self,
        input_file: &Path,
        output_dir: &Path,
        translated: &Document,
        bilingual: &Document,
        outcome: &WorkflowOutcome,
        workflow: &TranslationWorkflow,
    ) -> Result<()> {
        let path_for = |kind| FileManager::generate_output_path(input_file, output_dir, kind);

        translated.save(path_for(OutputKind::Translated))
            .context("Failed to save translated document")?;
        bilingual.save(path_for(OutputKind::Bilingual))
            .context("Failed to save bilingual document")?;
        FileManager::write_json(path_for(OutputKind::Usage), &outcome.usage)?;
        FileManager::write_json(path_for(OutputKind::Results), &outcome.results)?;
        FileManager::write_json(path_for(OutputKind::ModelMapping), &Self::model_mapping(workflow))?;

        for kind in OutputKind::ALL {
            debug!("Wrote {}", path_for(kind).display());
        }
        Ok(())
    }

    /// Role letters used in results to model names
    fn model_mapping(workflow: &TranslationWorkflow) -> serde_json::Value {
        let name = |model: &Arc<dyn LanguageModel>| model.model_name().to_string();
        let (translator, evaluator, optimizer) = workflow.models();
        json!({
            "Model A": name(translator),
            "Model B": name(evaluator),
            "Model C": name(optimizer),
        })
    }

    fn progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(PROGRESS_STEPS);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }

    fn progress_callback(progress_bar: ProgressBar) -> ProgressCallback {
        Arc::new(move |fraction, description| {
            progress_bar.set_position((fraction * PROGRESS_STEPS as f32).round() as u64);
            progress_bar.set_message(description.to_string());
        })
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
