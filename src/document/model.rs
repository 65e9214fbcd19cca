/*!
 * In-memory document tree.
 *
 * A `Document` is made of a body container plus a list of shared header/footer
 * containers ("stories") that sections reference by index. Containers hold
 * paragraphs followed by tables; paragraphs hold styled runs and opaque
 * embedded objects (formulas, drawings, fields) that must survive translation
 * untouched. The whole tree round-trips through JSON.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::DocumentError;

/// Complete document: body, shared stories and section layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Main body content
    pub body: Container,

    /// Header and footer containers, shared by index between sections
    #[serde(default)]
    pub stories: Vec<Container>,

    /// Section layout in document order
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Header/footer assignment of a single section.
///
/// Each slot holds an index into `Document::stories`. Two sections linking
/// to the same story share its paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_page_header: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even_page_header: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_page_footer: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even_page_footer: Option<usize>,
}

/// Kinds of story a section can reference, in extraction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryKind {
    Header,
    FirstPageHeader,
    EvenPageHeader,
    Footer,
    FirstPageFooter,
    EvenPageFooter,
}

impl StoryKind {
    /// All kinds, headers first then footers
    pub const ALL: [StoryKind; 6] = [
        StoryKind::Header,
        StoryKind::FirstPageHeader,
        StoryKind::EvenPageHeader,
        StoryKind::Footer,
        StoryKind::FirstPageFooter,
        StoryKind::EvenPageFooter,
    ];

    /// Short tag used inside segment ids
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Header => "h",
            Self::FirstPageHeader => "h1",
            Self::EvenPageHeader => "he",
            Self::Footer => "f",
            Self::FirstPageFooter => "f1",
            Self::EvenPageFooter => "fe",
        }
    }
}

impl Section {
    /// Story index linked to the given slot, if any
    pub fn story(&self, kind: StoryKind) -> Option<usize> {
        match kind {
            StoryKind::Header => self.header,
            StoryKind::FirstPageHeader => self.first_page_header,
            StoryKind::EvenPageHeader => self.even_page_header,
            StoryKind::Footer => self.footer,
            StoryKind::FirstPageFooter => self.first_page_footer,
            StoryKind::EvenPageFooter => self.even_page_footer,
        }
    }
}

/// Ordered paragraphs followed by tables
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    #[serde(default)]
    pub tables: Vec<Table>,
}

/// Table with a cell arena and a row/column grid of cell indices.
///
/// Horizontally or vertically merged cells repeat the same index in `rows`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub cells: Vec<Cell>,
    pub rows: Vec<Vec<usize>>,
}

impl Table {
    /// Build a table where every grid position owns its own cell
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let mut cells = Vec::new();
        let mut grid = Vec::with_capacity(rows.len());
        for row in rows {
            let mut indices = Vec::with_capacity(row.len());
            for cell in row {
                indices.push(cells.len());
                cells.push(cell);
            }
            grid.push(indices);
        }
        Self { cells, rows: grid }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl Cell {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }
}

/// A paragraph: ordered inline content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn new(inlines: Vec<Inline>) -> Self {
        Self { inlines }
    }

    /// Paragraph made of a single unformatted run
    pub fn plain(text: &str) -> Self {
        Self::new(vec![Inline::Run(Run::plain(text))])
    }

    /// Concatenated run text, embedded objects excluded
    pub fn text(&self) -> String {
        self.inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run.text.as_str()),
                Inline::Embedded(_) => None,
            })
            .collect()
    }

    /// All runs in order
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Embedded(_) => None,
        })
    }
}

/// Inline paragraph content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Run(Run),
    Embedded(EmbeddedObject),
}

/// A span of text sharing one formatting
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Run {
    pub text: String,

    #[serde(default)]
    pub format: RunFormat,
}

impl Run {
    pub fn new(text: impl Into<String>, format: RunFormat) -> Self {
        Self { text: text.into(), format }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunFormat::default())
    }
}

/// Character formatting of a run. `None` means inherited from the style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RunColor>,
}

impl RunFormat {
    pub fn bold() -> Self {
        Self { bold: Some(true), ..Default::default() }
    }

    pub fn italic() -> Self {
        Self { italic: Some(true), ..Default::default() }
    }

    /// Copy of this format suitable for a newly created run.
    ///
    /// Theme colors only resolve against the source document's theme and are
    /// not carried over.
    pub fn carried(&self) -> Self {
        let color = match &self.color {
            Some(RunColor::Rgb(rgb)) => Some(RunColor::Rgb(*rgb)),
            _ => None,
        };
        Self { color, ..self.clone() }
    }
}

/// Run color, either explicit or taken from the document theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunColor {
    Rgb([u8; 3]),
    Theme(String),
}

/// Opaque embedded content carried through translation untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedObject {
    pub kind: EmbeddedKind,

    /// Raw payload as stored in the source document
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl EmbeddedObject {
    pub fn formula(payload: serde_json::Value) -> Self {
        Self { kind: EmbeddedKind::Formula, payload }
    }

    pub fn object(payload: serde_json::Value) -> Self {
        Self { kind: EmbeddedKind::Object, payload }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedKind {
    /// Inline or display math
    Formula,
    /// Anything else: drawings, fields, content controls
    Object,
}

/// Container a paragraph lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerRef {
    Body,
    Story(usize),
}

/// Position of a paragraph inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphSlot {
    Body { paragraph: usize },
    Cell { table: usize, cell: usize, paragraph: usize },
}

/// Structural identity of a paragraph.
///
/// Shared stories and merged table cells resolve to the same key no matter
/// which section or grid position reached them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParagraphKey {
    pub container: ContainerRef,
    pub slot: ParagraphSlot,
}

impl std::fmt::Display for ParagraphKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.container {
            ContainerRef::Body => write!(f, "body")?,
            ContainerRef::Story(index) => write!(f, "story {}", index)?,
        }
        match self.slot {
            ParagraphSlot::Body { paragraph } => write!(f, " paragraph {}", paragraph),
            ParagraphSlot::Cell { table, cell, paragraph } => {
                write!(f, " table {} cell {} paragraph {}", table, cell, paragraph)
            }
        }
    }
}

impl Container {
    fn paragraph(&self, slot: ParagraphSlot) -> Option<&Paragraph> {
        match slot {
            ParagraphSlot::Body { paragraph } => self.paragraphs.get(paragraph),
            ParagraphSlot::Cell { table, cell, paragraph } => self
                .tables
                .get(table)?
                .cells
                .get(cell)?
                .paragraphs
                .get(paragraph),
        }
    }

    fn paragraph_mut(&mut self, slot: ParagraphSlot) -> Option<&mut Paragraph> {
        match slot {
            ParagraphSlot::Body { paragraph } => self.paragraphs.get_mut(paragraph),
            ParagraphSlot::Cell { table, cell, paragraph } => self
                .tables
                .get_mut(table)?
                .cells
                .get_mut(cell)?
                .paragraphs
                .get_mut(paragraph),
        }
    }
}

impl Document {
    /// Load a document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a document from a JSON string
    pub fn from_json(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save the document as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn container(&self, container: ContainerRef) -> Option<&Container> {
        match container {
            ContainerRef::Body => Some(&self.body),
            ContainerRef::Story(index) => self.stories.get(index),
        }
    }

    pub fn container_mut(&mut self, container: ContainerRef) -> Option<&mut Container> {
        match container {
            ContainerRef::Body => Some(&mut self.body),
            ContainerRef::Story(index) => self.stories.get_mut(index),
        }
    }

    pub fn paragraph(&self, key: &ParagraphKey) -> Option<&Paragraph> {
        self.container(key.container)?.paragraph(key.slot)
    }

    pub fn paragraph_mut(&mut self, key: &ParagraphKey) -> Option<&mut Paragraph> {
        self.container_mut(key.container)?.paragraph_mut(key.slot)
    }
}
