/*!
 * Common test utilities for the docufluent test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;

use docufluent::document::{Cell, Container, Document, EmbeddedObject, Inline, Paragraph, Run, RunFormat, Section, Table};

pub mod scripted_model;

pub use scripted_model::{Role, ScriptedModel};

/// Route `log` output through env_logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small report: formatted body text, a formula, a table and a shared header.
///
/// Segments in extraction order: `p_0`, `p_1` (simple), `p_2`,
/// `t_0_r_0_c_0_p_0`, `t_0_r_0_c_1_p_0`, `s_0_h_p_0`.
pub fn sample_document() -> Document {
    let mut doc = Document::default();

    doc.body.paragraphs.push(Paragraph::new(vec![
        Inline::Run(Run::new("Pump", RunFormat::bold())),
        Inline::Run(Run::plain(" pressure rises.")),
    ]));
    doc.body.paragraphs.push(Paragraph::plain("12.5 %"));
    doc.body.paragraphs.push(Paragraph::new(vec![
        Inline::Run(Run::plain("The flow is ")),
        Inline::Embedded(EmbeddedObject::formula(json!({"tex": "Q = vA"}))),
        Inline::Run(Run::new(" per second", RunFormat::italic())),
    ]));
    doc.body.tables.push(Table::from_rows(vec![vec![
        Cell::new(vec![Paragraph::plain("Valve")]),
        Cell::new(vec![Paragraph::plain("Open slowly")]),
    ]]));

    doc.stories.push(header_story());
    doc.sections.push(Section { header: Some(0), ..Default::default() });
    doc.sections.push(Section { header: Some(0), ..Default::default() });

    doc
}

fn header_story() -> Container {
    Container {
        paragraphs: vec![Paragraph::plain("Maintenance manual")],
        tables: Vec::new(),
    }
}

/// Write `document` as JSON into `dir`
pub fn write_document(dir: &Path, filename: &str, document: &Document) -> Result<PathBuf> {
    let path = dir.join(filename);
    document.save(&path)?;
    Ok(path)
}
