/*!
 * Format-preserving reconstruction.
 *
 * Each translated paragraph is rebuilt from scratch: the original paragraph is
 * flattened into atoms (characters tagged with the run that produced them,
 * plus one atom per embedded object), the translation is tokenised the same
 * way, and the matching blocks between the two decide which characters
 * inherit formatting from an original run. Everything else becomes plain
 * text, and placeholder tokens the segment owns turn back into deep copies
 * of their embedded objects.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::align::matching_blocks;
use super::model::{Document, EmbeddedKind, Inline, Paragraph, Run, RunColor, RunFormat};
use super::segment::{placeholder_token, Segment, PLACEHOLDER_PATTERN};
use crate::errors::DocumentError;

/// Appended translation color when the quality score is below 5
pub const FAILURE_COLOR: [u8; 3] = [255, 0, 0];

/// Appended translation color when the quality score is below 8.5
pub const WARNING_COLOR: [u8; 3] = [255, 192, 0];

/// Translation text plus the quality score used for color flagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BilingualEntry {
    pub text: String,
    pub score: f32,
}

impl BilingualEntry {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self { text: text.into(), score }
    }
}

/// Color override for a bilingual entry, if its score calls for one
pub fn score_color(score: f32) -> Option<[u8; 3]> {
    if score < 5.0 {
        Some(FAILURE_COLOR)
    } else if score < 8.5 {
        Some(WARNING_COLOR)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Atom {
    Char(char),
    Placeholder(String),
}

/// Where an emitted character takes its formatting from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Inserted,
    Run(usize),
}

/// Splices translations back into the document the segments came from
#[derive(Debug, Clone)]
pub struct Reconstructor {
    segments: Vec<Segment>,
}

impl Reconstructor {
    pub fn new(segments: &[Segment]) -> Self {
        Self { segments: segments.to_vec() }
    }

    /// Replace each translated paragraph's content in place.
    ///
    /// Segments whose translation equals the original (ignoring surrounding
    /// whitespace) are left untouched. Returns the number of rewritten paragraphs.
    pub fn apply_translations(
        &self,
        document: &mut Document,
        translations: &HashMap<String, String>,
    ) -> Result<usize, DocumentError> {
        let mut rewritten = 0;

        for segment in &self.segments {
            let Some(translation) = translations.get(&segment.id) else {
                continue;
            };
            if translation.trim() == segment.original_text.trim() {
                continue;
            }

            let paragraph = document
                .paragraph_mut(&segment.container_ref)
                .ok_or_else(|| DocumentError::MissingParagraph(segment.container_ref.to_string()))?;

            paragraph.inlines = rebuild(paragraph, segment, translation, None);
            rewritten += 1;
        }

        debug!("Rewrote {} of {} paragraphs", rewritten, self.segments.len());
        Ok(rewritten)
    }

    /// Produce a copy of `document` with each translation appended under its original.
    pub fn render_bilingual(
        &self,
        document: &Document,
        translations: &HashMap<String, BilingualEntry>,
    ) -> Result<Document, DocumentError> {
        let mut bilingual = document.clone();

        for segment in &self.segments {
            let Some(entry) = translations.get(&segment.id) else {
                continue;
            };
            let paragraph = bilingual
                .paragraph_mut(&segment.container_ref)
                .ok_or_else(|| DocumentError::MissingParagraph(segment.container_ref.to_string()))?;

            if entry.text.trim() == paragraph.text().trim() || entry.text.trim() == segment.original_text.trim() {
                continue;
            }

            let appended = rebuild(paragraph, segment, &entry.text, score_color(entry.score));
            paragraph.inlines.push(Inline::Run(Run::plain("\n")));
            paragraph.inlines.extend(appended);
        }

        Ok(bilingual)
    }
}

/// Original paragraph as atoms, each tagged with the inline it came from
fn original_atoms(paragraph: &Paragraph) -> (Vec<Atom>, Vec<Origin>) {
    let mut atoms = Vec::new();
    let mut origins = Vec::new();
    let mut formulas = 0;
    let mut objects = 0;

    for (index, inline) in paragraph.inlines.iter().enumerate() {
        match inline {
            Inline::Run(run) => {
                for c in run.text.chars() {
                    atoms.push(Atom::Char(c));
                    origins.push(Origin::Run(index));
                }
            }
            Inline::Embedded(object) => {
                let counter = match object.kind {
                    EmbeddedKind::Formula => &mut formulas,
                    EmbeddedKind::Object => &mut objects,
                };
                atoms.push(Atom::Placeholder(placeholder_token(object.kind, *counter)));
                origins.push(Origin::Inserted);
                *counter += 1;
            }
        }
    }

    (atoms, origins)
}

/// Translation as atoms. Only tokens the segment owns become placeholders.
fn translation_atoms(translation: &str, segment: &Segment) -> Vec<Atom> {
    let mut atoms = Vec::new();
    let mut last = 0;

    for found in PLACEHOLDER_PATTERN.find_iter(translation) {
        if !segment.has_placeholder(found.as_str()) {
            continue;
        }
        atoms.extend(translation[last..found.start()].chars().map(Atom::Char));
        atoms.push(Atom::Placeholder(found.as_str().to_string()));
        last = found.end();
    }
    atoms.extend(translation[last..].chars().map(Atom::Char));

    atoms
}

/// Accumulates emitted atoms into runs and embedded objects
struct Emitter<'a> {
    paragraph: &'a Paragraph,
    segment: &'a Segment,
    color: Option<[u8; 3]>,
    inlines: Vec<Inline>,
    pending: Option<(Origin, String)>,
}

impl<'a> Emitter<'a> {
    fn push(&mut self, atom: &Atom, origin: Origin) {
        match atom {
            Atom::Char(c) => match &mut self.pending {
                Some((current, text)) if *current == origin => text.push(*c),
                _ => {
                    self.flush();
                    self.pending = Some((origin, c.to_string()));
                }
            },
            Atom::Placeholder(token) => {
                self.flush();
                match self.segment.placeholders.get(token) {
                    Some(object) => self.inlines.push(Inline::Embedded(object.clone())),
                    None => warn!("Placeholder {} missing from segment {}", token, self.segment.id),
                }
            }
        }
    }

    fn flush(&mut self) {
        let Some((origin, text)) = self.pending.take() else {
            return;
        };
        let mut format = match origin {
            Origin::Run(index) => match self.paragraph.inlines.get(index) {
                Some(Inline::Run(run)) => run.format.carried(),
                _ => RunFormat::default(),
            },
            Origin::Inserted => RunFormat::default(),
        };
        if let Some(rgb) = self.color {
            format.color = Some(RunColor::Rgb(rgb));
        }
        self.inlines.push(Inline::Run(Run::new(text, format)));
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush();
        self.inlines
    }
}

fn rebuild(paragraph: &Paragraph, segment: &Segment, translation: &str, color: Option<[u8; 3]>) -> Vec<Inline> {
    let (original, origins) = original_atoms(paragraph);
    let target = translation_atoms(translation, segment);
    let blocks = matching_blocks(&original, &target);

    let mut emitter = Emitter {
        paragraph,
        segment,
        color,
        inlines: Vec::new(),
        pending: None,
    };

    let mut position = 0;
    for block in blocks {
        for atom in &target[position..block.b] {
            emitter.push(atom, Origin::Inserted);
        }
        for offset in 0..block.size {
            emitter.push(&target[block.b + offset], origins[block.a + offset]);
        }
        position = block.b + block.size;
    }
    for atom in &target[position..] {
        emitter.push(atom, Origin::Inserted);
    }

    emitter.finish()
}
