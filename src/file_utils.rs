use anyhow::{Result, Context};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

/// Kinds of files written next to each other for one input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Document with translations applied
    Translated,
    /// Document with translations appended under each original paragraph
    Bilingual,
    /// Token usage report
    Usage,
    /// Per-segment workflow results
    Results,
    /// Role to model name mapping
    ModelMapping,
}

impl OutputKind {
    pub const ALL: [OutputKind; 5] = [
        OutputKind::Translated,
        OutputKind::Bilingual,
        OutputKind::Usage,
        OutputKind::Results,
        OutputKind::ModelMapping,
    ];

    /// Filename suffix appended to the input stem
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Translated => "translated",
            Self::Bilingual => "bilingual",
            Self::Usage => "usage",
            Self::Results => "results",
            Self::ModelMapping => "model_mapping",
        }
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path `{stem}_{suffix}.json`
    // @params: input_file, output_dir, kind
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        kind: OutputKind,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let output_filename = format!("{}_{}.json", stem.to_string_lossy(), kind.suffix());
        output_dir.as_ref().join(output_filename)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Serialize `value` as pretty JSON into `path`
    pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize JSON for: {:?}", path.as_ref()))?;
        Self::write_to_file(path, &content)
    }
}
