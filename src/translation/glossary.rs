/*!
 * Terminology glossary.
 *
 * An ordered list of forced source -> target term mappings injected into every
 * translate, evaluate and optimize prompt.
 */

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

/// A single forced term mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlossaryTerm {
    pub source: String,
    pub target: String,
}

/// Ordered, deduplicated term pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: Vec<GlossaryTerm>,
}

impl Glossary {
    /// Build from pairs, keeping the first occurrence of each pair
    pub fn new<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut glossary = Self::default();
        for (source, target) in pairs {
            glossary.add(source, target);
        }
        glossary
    }

    /// Add a pair unless the exact same pair is already present
    pub fn add(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let term = GlossaryTerm {
            source: source.into().trim().to_string(),
            target: target.into().trim().to_string(),
        };
        if term.source.is_empty() || term.target.is_empty() {
            return;
        }
        if !self.terms.contains(&term) {
            self.terms.push(term);
        }
    }

    pub fn terms(&self) -> &[GlossaryTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// One `source -> target` line per term
    pub fn to_prompt_block(&self) -> String {
        self.terms
            .iter()
            .map(|term| format!("{} -> {}", term.source, term.target))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse glossary text.
    ///
    /// Accepted line shapes: markdown table rows (`| source | target |`),
    /// `source -> target`, and tab-separated pairs. Header and separator rows
    /// of markdown tables are skipped, as are lines that fit none of the shapes.
    pub fn parse(text: &str) -> Self {
        let mut glossary = Self::default();
        let mut in_table = false;

        for line in text.lines() {
            let line = line.trim();
            if !line.starts_with('|') {
                in_table = false;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('|') {
                // first row of each table is its header
                if !in_table {
                    in_table = true;
                    continue;
                }
                let cells: Vec<&str> = line.trim_matches('|').split('|').map(str::trim).collect();
                let separator = cells.iter().all(|c| c.chars().all(|ch| matches!(ch, '-' | ':')));
                if cells.len() >= 2 && !separator {
                    glossary.add(cells[0], cells[1]);
                }
            } else if let Some((source, target)) = line.split_once("->") {
                glossary.add(source, target);
            } else if let Some((source, target)) = line.split_once('\t') {
                glossary.add(source, target);
            }
        }

        debug!("Parsed {} glossary terms", glossary.len());
        glossary
    }

    /// Read and parse a glossary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read glossary file: {:?}", path.as_ref()))?;
        Ok(Self::parse(&content))
    }
}
