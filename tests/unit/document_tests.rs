/*!
 * Tests for extraction and reconstruction over whole documents
 */

use std::collections::HashMap;

use docufluent::document::{
    extract, BilingualEntry, Cell, ContainerRef, Document, EmbeddedKind, Inline, Paragraph,
    Reconstructor, RunFormat, Table,
};

use crate::common::sample_document;

fn embedded_count(paragraph: &Paragraph) -> usize {
    paragraph
        .inlines
        .iter()
        .filter(|inline| matches!(inline, Inline::Embedded(_)))
        .count()
}

#[test]
fn test_extract_withSampleDocument_shouldVisitBodyTablesThenStories() {
    let segments = extract(&sample_document());
    let ids: Vec<&str> = segments.iter().map(|segment| segment.id.as_str()).collect();

    assert_eq!(
        ids,
        vec!["p_0", "p_1", "p_2", "t_0_r_0_c_0_p_0", "t_0_r_0_c_1_p_0", "s_0_h_p_0"]
    );
    assert_eq!(segments[0].original_text, "Pump pressure rises.");
    assert_eq!(segments[2].original_text, "The flow is {{MATH_0}} per second");
    assert!(segments[2].has_placeholder("{{MATH_0}}"));
    assert_eq!(segments[5].container_ref.container, ContainerRef::Story(0));
}

#[test]
fn test_extract_withMergedCell_shouldEmitCellOnce() {
    let mut doc = Document::default();
    doc.body.tables.push(Table {
        cells: vec![Cell::new(vec![Paragraph::plain("Merged heading")])],
        rows: vec![vec![0, 0], vec![0, 0]],
    });

    let segments = extract(&doc);

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id, "t_0_r_0_c_0_p_0");
}

#[test]
fn test_applyTranslations_withOriginalTexts_shouldLeaveDocumentUnchanged() {
    let original = sample_document();
    let segments = extract(&original);
    let translations: HashMap<String, String> = segments
        .iter()
        .map(|segment| (segment.id.clone(), format!("  {}  ", segment.original_text)))
        .collect();

    let mut document = original.clone();
    let rewritten = Reconstructor::new(&segments)
        .apply_translations(&mut document, &translations)
        .unwrap();

    assert_eq!(rewritten, 0);
    assert_eq!(document, original);
}

#[test]
fn test_applyTranslations_withFormula_shouldRestoreEmbeddedObjectOnce() {
    let original = sample_document();
    let segments = extract(&original);
    let formula = segments[2].placeholders["{{MATH_0}}"].clone();
    let translations = HashMap::from([("p_2".to_string(), "流量为 {{MATH_0}} 每秒".to_string())]);

    let mut document = original.clone();
    Reconstructor::new(&segments)
        .apply_translations(&mut document, &translations)
        .unwrap();

    let paragraph = &document.body.paragraphs[2];
    assert_eq!(embedded_count(paragraph), 1);
    assert!(paragraph.inlines.contains(&Inline::Embedded(formula)));
    assert_eq!(paragraph.text(), "流量为  每秒");
}

#[test]
fn test_applyTranslations_withDroppedPlaceholder_shouldDropObject() {
    let original = sample_document();
    let segments = extract(&original);
    let translations = HashMap::from([("p_2".to_string(), "流量".to_string())]);

    let mut document = original.clone();
    Reconstructor::new(&segments)
        .apply_translations(&mut document, &translations)
        .unwrap();

    assert_eq!(embedded_count(&document.body.paragraphs[2]), 0);
    assert_eq!(document.body.paragraphs[2].text(), "流量");
}

#[test]
fn test_applyTranslations_withSharedPrefix_shouldKeepBoldRun() {
    let original = sample_document();
    let segments = extract(&original);
    let translations = HashMap::from([("p_0".to_string(), "Pump 压力上升。".to_string())]);

    let mut document = original.clone();
    Reconstructor::new(&segments)
        .apply_translations(&mut document, &translations)
        .unwrap();

    let first = document.body.paragraphs[0].runs().next().unwrap();
    assert_eq!(first.text, "Pump");
    assert_eq!(first.format, RunFormat::bold());
    assert_eq!(document.body.paragraphs[0].text(), "Pump 压力上升。");
}

#[test]
fn test_renderBilingual_withSharedHeader_shouldAppendOnce() {
    let original = sample_document();
    let segments = extract(&original);
    let entries = HashMap::from([("s_0_h_p_0".to_string(), BilingualEntry::new("维护手册", 9.0))]);

    let bilingual = Reconstructor::new(&segments)
        .render_bilingual(&original, &entries)
        .unwrap();

    let header = &bilingual.stories[0].paragraphs[0];
    assert_eq!(header.text(), "Maintenance manual\n维护手册");
    assert_eq!(bilingual.body, original.body);
    assert_eq!(original.stories[0].paragraphs[0].text(), "Maintenance manual");
}

#[test]
fn test_renderBilingual_withFormula_shouldCopyObjectIntoTranslation() {
    let original = sample_document();
    let segments = extract(&original);
    let entries = HashMap::from([("p_2".to_string(), BilingualEntry::new("流量为 {{MATH_0}} 每秒", 9.0))]);

    let bilingual = Reconstructor::new(&segments)
        .render_bilingual(&original, &entries)
        .unwrap();

    let paragraph = &bilingual.body.paragraphs[2];
    // original formula plus its copy in the appended translation
    assert_eq!(embedded_count(paragraph), 2);
    assert!(paragraph.inlines.iter().all(|inline| match inline {
        Inline::Embedded(object) => object.kind == EmbeddedKind::Formula,
        Inline::Run(_) => true,
    }));
}
