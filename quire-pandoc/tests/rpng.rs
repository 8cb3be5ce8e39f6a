//! Side channel properties.

use proptest::prelude::*;
use quire_pandoc::ast::{Block, Inline, Meta, Pandoc};
use quire_pandoc::codec::{decode_document, Resolved};
use quire_pandoc::rpng::{self, ChunkKind, Png, ALT_TEXT_TITLE, KEYWORD};
use quire_schema::{Entity, Node};

fn blank() -> Vec<u8> {
    Png::blank(4, 3).unwrap().to_bytes()
}

fn text_chunks(image: &[u8]) -> usize {
    Png::parse(image)
        .unwrap()
        .chunks()
        .iter()
        .filter(|chunk| &chunk.tag == b"tEXt" || &chunk.tag == b"zTXt")
        .count()
}

#[test]
fn test_insert_is_idempotent_and_latest_wins() {
    for kind in [ChunkKind::Text, ChunkKind::Compressed] {
        let once = rpng::insert(KEYWORD, "first", &blank(), kind).unwrap();
        let twice = rpng::insert(KEYWORD, "second", &once, kind).unwrap();
        assert_eq!(text_chunks(&twice), 1);
        assert_eq!(rpng::extract(KEYWORD, &twice).unwrap(), "second");

        let again = rpng::insert(KEYWORD, "second", &twice, kind).unwrap();
        assert_eq!(again, twice);
    }
}

#[test]
fn test_switching_chunk_kind_replaces_the_payload() {
    let text = rpng::insert(KEYWORD, "plain", &blank(), ChunkKind::Text).unwrap();
    let compressed = rpng::insert(KEYWORD, "packed", &text, ChunkKind::Compressed).unwrap();
    assert_eq!(text_chunks(&compressed), 1);
    assert_eq!(rpng::extract(KEYWORD, &compressed).unwrap(), "packed");
}

#[test]
fn test_other_keywords_are_left_alone() {
    let image = rpng::insert("Author", "someone", &blank(), ChunkKind::Text).unwrap();
    let image = rpng::insert(KEYWORD, "{}", &image, ChunkKind::Text).unwrap();
    assert_eq!(rpng::extract("Author", &image).unwrap(), "someone");
    assert!(rpng::has(KEYWORD, &image));
}

#[test]
fn test_alt_text_payload_decodes_without_image_bytes() {
    assert_eq!(
        rpng::decode_alt_text(ALT_TEXT_TITLE, "42"),
        Some(Node::Number(42.0))
    );
    assert_eq!(rpng::decode_alt_text("", "42"), None);

    // the image points nowhere; only its alt text is read
    let doc = Pandoc::new(
        Meta::new(),
        vec![Block::Para(vec![Inline::Image(
            (String::new(), Vec::new(), Vec::new()),
            vec![Inline::Str("42".to_string())],
            (
                "/definitely/not/here.png".to_string(),
                ALT_TEXT_TITLE.to_string(),
            ),
        )])],
    );
    let node = decode_document(&doc, &Resolved::default());
    let Node::Entity(Entity::Article(article)) = node else {
        panic!("expected article");
    };
    let content = article.content.unwrap_or_default();
    let Some(Node::Entity(Entity::Paragraph(paragraph))) = content.first() else {
        panic!("expected paragraph, got {content:?}");
    };
    assert_eq!(paragraph.content, vec![Node::Number(42.0)]);
}

proptest! {
    #[test]
    fn arbitrary_bytes_carry_no_payload(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert!(!rpng::has(KEYWORD, &bytes));
        prop_assert!(rpng::sniff_bytes(&bytes).unwrap().is_none());
    }

    #[test]
    fn untouched_pngs_carry_no_payload(width in 1u32..32, height in 1u32..32) {
        let image = Png::blank(width, height).unwrap().to_bytes();
        prop_assert!(!rpng::has(KEYWORD, &image));
        prop_assert!(rpng::sniff_bytes(&image).unwrap().is_none());
    }
}
