/*!
 * Segment extraction.
 *
 * Walks the body, then every section's headers and footers, and turns each
 * non-empty paragraph into a `Segment`. Paragraphs reachable from more than
 * one place (shared stories, merged cells) are emitted once, under the id of
 * the first path that reached them.
 */

use log::debug;
use std::collections::{BTreeMap, HashSet};

use super::model::{
    Container, ContainerRef, Document, EmbeddedKind, EmbeddedObject, Inline, Paragraph,
    ParagraphKey, ParagraphSlot, StoryKind,
};
use super::segment::{placeholder_token, Segment};

/// Extract all translatable segments in document order
pub fn extract(document: &Document) -> Vec<Segment> {
    let mut extractor = Extractor::default();
    extractor.walk_container(&document.body, ContainerRef::Body, "");

    for (section_index, section) in document.sections.iter().enumerate() {
        for kind in StoryKind::ALL {
            let Some(story) = section.story(kind) else {
                continue;
            };
            let Some(container) = document.stories.get(story) else {
                debug!("Section {} references missing story {}", section_index, story);
                continue;
            };
            let prefix = format!("s_{}_{}_", section_index, kind.tag());
            extractor.walk_container(container, ContainerRef::Story(story), &prefix);
        }
    }

    debug!("Extracted {} segments", extractor.segments.len());
    extractor.segments
}

#[derive(Default)]
struct Extractor {
    visited: HashSet<ParagraphKey>,
    segments: Vec<Segment>,
}

impl Extractor {
    fn walk_container(&mut self, container: &Container, container_ref: ContainerRef, prefix: &str) {
        for (index, paragraph) in container.paragraphs.iter().enumerate() {
            let key = ParagraphKey {
                container: container_ref,
                slot: ParagraphSlot::Body { paragraph: index },
            };
            self.visit(paragraph, key, format!("{}p_{}", prefix, index));
        }

        for (table_index, table) in container.tables.iter().enumerate() {
            for (row_index, row) in table.rows.iter().enumerate() {
                for (column_index, &cell_index) in row.iter().enumerate() {
                    let Some(cell) = table.cells.get(cell_index) else {
                        continue;
                    };
                    for (paragraph_index, paragraph) in cell.paragraphs.iter().enumerate() {
                        let key = ParagraphKey {
                            container: container_ref,
                            slot: ParagraphSlot::Cell {
                                table: table_index,
                                cell: cell_index,
                                paragraph: paragraph_index,
                            },
                        };
                        let id = format!(
                            "{}t_{}_r_{}_c_{}_p_{}",
                            prefix, table_index, row_index, column_index, paragraph_index
                        );
                        self.visit(paragraph, key, id);
                    }
                }
            }
        }
    }

    fn visit(&mut self, paragraph: &Paragraph, key: ParagraphKey, id: String) {
        if !self.visited.insert(key) {
            return;
        }

        let (text, placeholders) = flatten(paragraph);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.segments.push(Segment {
            id,
            original_text: text.to_string(),
            placeholders,
            container_ref: key,
        });
    }
}

/// Paragraph text with embedded objects replaced by placeholder tokens
fn flatten(paragraph: &Paragraph) -> (String, BTreeMap<String, EmbeddedObject>) {
    let mut text = String::new();
    let mut placeholders = BTreeMap::new();
    let mut formulas = 0;
    let mut objects = 0;

    for inline in &paragraph.inlines {
        match inline {
            Inline::Run(run) => text.push_str(&run.text),
            Inline::Embedded(object) => {
                let counter = match object.kind {
                    EmbeddedKind::Formula => &mut formulas,
                    EmbeddedKind::Object => &mut objects,
                };
                let token = placeholder_token(object.kind, *counter);
                *counter += 1;
                text.push_str(&token);
                placeholders.insert(token, object.clone());
            }
        }
    }

    (text, placeholders)
}
