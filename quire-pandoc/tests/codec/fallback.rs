use crate::common::{article, capture_warnings, content_of, para, text};
use quire_pandoc::ast::{self, Block, Inline};
use quire_pandoc::codec::{decode_document, encode_node, Resolved};
use quire_schema::{Entity, Node, Paragraph};
use std::collections::BTreeMap;

fn hologram() -> Node {
    let mut object = BTreeMap::new();
    object.insert("type".to_string(), text("Hologram"));
    object.insert("depth".to_string(), Node::Number(3.0));
    Node::Object(object)
}

#[test]
fn test_unknown_block_kind_warns_once() {
    let node = article(vec![
        para(vec![text("before")]),
        hologram(),
        para(vec![text("after")]),
    ]);
    let (doc, warnings) = capture_warnings(|| encode_node(&node));

    assert_eq!(warnings.len(), 1, "{warnings:#?}");
    assert!(warnings[0].contains("Hologram"), "{}", warnings[0]);

    let json = ast::to_json(&doc).unwrap();
    let parsed = ast::parse(&json).unwrap();
    assert_eq!(
        parsed.blocks,
        vec![
            Block::Para(vec![Inline::Str("before".to_string())]),
            Block::Para(Vec::new()),
            Block::Para(vec![Inline::Str("after".to_string())]),
        ]
    );
}

#[test]
fn test_unknown_inline_kind_warns_once() {
    let node = article(vec![para(vec![text("a "), hologram(), text(" b")])]);
    let (doc, warnings) = capture_warnings(|| encode_node(&node));
    assert_eq!(warnings.len(), 1, "{warnings:#?}");
    assert!(ast::parse(&ast::to_json(&doc).unwrap()).is_ok());
}

#[test]
fn test_unknown_pandoc_elements_decode_to_empty_content() {
    let json = r#"{
        "pandoc-api-version": [1, 17, 5, 4],
        "meta": {},
        "blocks": [
            {"t": "Figure", "c": [["", [], []], [null, []], []]},
            {"t": "Para", "c": [{"t": "Str", "c": "ok"}, {"t": "Underline", "c": []}]}
        ]
    }"#;
    let doc = ast::parse(json).unwrap();
    let (node, logged) = capture_warnings(|| {
        decode_document(&doc, &Resolved::default())
    });

    assert_eq!(logged.len(), 2, "{logged:#?}");
    assert_eq!(
        content_of(node),
        vec![
            Node::Entity(Entity::Paragraph(Paragraph::default())),
            para(vec![text("ok")]),
        ]
    );
}
