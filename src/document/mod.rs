/*!
 * Document handling: the in-memory tree, segment extraction and the
 * format-preserving reconstruction of translated paragraphs.
 *
 * - `model`: document tree and JSON persistence
 * - `segment`: translatable segments and placeholder tokens
 * - `extract`: document to segments
 * - `align`: matching-block computation
 * - `reconstruct`: translations back into the document, plus the bilingual view
 */

pub mod align;
pub mod extract;
pub mod model;
pub mod reconstruct;
pub mod segment;

pub use self::extract::extract;
pub use self::model::{
    Cell, Container, ContainerRef, Document, EmbeddedKind, EmbeddedObject, Inline, Paragraph,
    ParagraphKey, ParagraphSlot, Run, RunColor, RunFormat, Section, StoryKind, Table,
};
pub use self::reconstruct::{BilingualEntry, Reconstructor};
pub use self::segment::Segment;
