use crate::common::{article, content_of, para, text};
use quire_pandoc::ast::{self, Block, Inline};
use quire_pandoc::rpng::{RpngSettings, RpngStrategy};
use quire_pandoc::store::DirectoryStore;
use quire_pandoc::{decode, encode, CodecError, DecodeContext, DecodeSettings, EncodeSettings};
use quire_schema::{CodeChunk, CodeExpression, Entity, Node};
use std::sync::Arc;

fn json_encode_settings(strategy: RpngStrategy) -> EncodeSettings {
    let mut settings = EncodeSettings {
        format: "json".to_string(),
        ..Default::default()
    };
    settings.context.rpng = RpngSettings {
        strategy,
        ..Default::default()
    };
    settings
}

fn json_decode_settings() -> DecodeSettings {
    DecodeSettings {
        format: "json".to_string(),
        ..Default::default()
    }
}

fn chunk() -> CodeChunk {
    CodeChunk {
        text: "plot(x, y)".to_string(),
        programming_language: Some("r".to_string()),
        ..Default::default()
    }
}

fn expression() -> Node {
    Node::Entity(Entity::CodeExpression(CodeExpression {
        text: "2 * 21".to_string(),
        programming_language: Some("python".to_string()),
        output: Some(Box::new(Node::Number(42.0))),
        ..Default::default()
    }))
}

async fn through_json(content: Vec<Node>, strategy: RpngStrategy) -> Vec<Node> {
    let bytes = encode(&article(content), &json_encode_settings(strategy))
        .await
        .unwrap();
    content_of(decode(&bytes, &json_decode_settings()).await.unwrap())
}

#[tokio::test]
async fn test_code_chunks_survive_as_rpng_chunks() {
    let node = Node::Entity(Entity::CodeChunk(chunk()));
    let decoded = through_json(vec![node.clone()], RpngStrategy::Chunk).await;
    assert_eq!(decoded, vec![node]);
}

#[tokio::test]
async fn test_chunk_captions_stay_visible() {
    let captioned = Node::Entity(Entity::CodeChunk(CodeChunk {
        label: Some("Figure 1".to_string()),
        caption: Some(vec![para(vec![text("Plot")])]),
        ..chunk()
    }));
    let bytes = encode(&article(vec![captioned.clone()]), &json_encode_settings(RpngStrategy::Chunk))
        .await
        .unwrap();

    let doc = ast::parse(std::str::from_utf8(&bytes).unwrap()).unwrap();
    let [Block::Div((_, _, style), _), Block::Div((_, _, caption_style), caption)] =
        doc.blocks.as_slice()
    else {
        panic!("expected chunk and caption containers, got {:?}", doc.blocks);
    };
    assert_eq!(style, &vec![("custom-style".to_string(), "CodeChunk".to_string())]);
    assert_eq!(
        caption_style,
        &vec![("custom-style".to_string(), "CodeChunkCaption".to_string())]
    );
    assert_eq!(
        caption,
        &vec![Block::Para(vec![
            Inline::Strong(vec![Inline::Str("Figure 1.".to_string())]),
            Inline::Space,
            Inline::Str("Plot".to_string()),
        ])]
    );

    let decoded = content_of(decode(&bytes, &json_decode_settings()).await.unwrap());
    assert_eq!(decoded, vec![captioned]);
}

#[tokio::test]
async fn test_edited_chunk_captions_win_over_the_payload() {
    let captioned = Node::Entity(Entity::CodeChunk(CodeChunk {
        label: Some("Figure 1".to_string()),
        caption: Some(vec![para(vec![text("Plot")])]),
        ..chunk()
    }));
    let bytes = encode(&article(vec![captioned]), &json_encode_settings(RpngStrategy::Chunk))
        .await
        .unwrap();
    let edited = String::from_utf8(bytes).unwrap().replace("\"Plot\"", "\"Scatter\"");

    let decoded = content_of(decode(edited.as_bytes(), &json_decode_settings()).await.unwrap());
    let [Node::Entity(Entity::CodeChunk(chunk))] = decoded.as_slice() else {
        panic!("expected a code chunk, got {decoded:?}");
    };
    assert_eq!(chunk.caption, Some(vec![para(vec![text("Scatter")])]));
}

#[tokio::test]
async fn test_chunk_outputs_are_elided_by_default() {
    let with_outputs = CodeChunk {
        outputs: Some(vec![Node::Number(1.0), text("printed")]),
        ..chunk()
    };
    let decoded = through_json(
        vec![Node::Entity(Entity::CodeChunk(with_outputs))],
        RpngStrategy::Chunk,
    )
    .await;
    assert_eq!(decoded, vec![Node::Entity(Entity::CodeChunk(chunk()))]);
}

#[tokio::test]
async fn test_code_expressions_survive_inline() {
    let content = vec![para(vec![text("The answer is "), expression(), text(".")])];
    let decoded = through_json(content.clone(), RpngStrategy::Chunk).await;
    assert_eq!(decoded, content);
}

#[tokio::test]
async fn test_alt_text_strategy() {
    let content = vec![
        Node::Entity(Entity::CodeChunk(chunk())),
        para(vec![expression()]),
    ];
    let decoded = through_json(content.clone(), RpngStrategy::AltText).await;
    assert_eq!(decoded, content);
}

#[tokio::test]
async fn test_link_strategy_round_trips_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new(dir.path()).unwrap());

    let mut encode_settings = json_encode_settings(RpngStrategy::Link);
    encode_settings.context.store = Some(store.clone());
    let node = Node::Entity(Entity::CodeChunk(chunk()));
    let bytes = encode(&article(vec![node.clone()]), &encode_settings)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("file://"));

    let decode_settings = DecodeSettings {
        context: DecodeContext {
            store: Some(store),
            ..Default::default()
        },
        ..json_decode_settings()
    };
    let decoded = content_of(decode(&bytes, &decode_settings).await.unwrap());
    assert_eq!(decoded, vec![node]);
}

#[tokio::test]
async fn test_link_strategy_without_store_fails() {
    let err = encode(
        &article(vec![Node::Entity(Entity::CodeChunk(chunk()))]),
        &json_encode_settings(RpngStrategy::Link),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CodecError::Rpng(_)), "{err}");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let err = decode(b"{\"blocks\": 3}", &json_decode_settings())
        .await
        .unwrap_err();
    assert!(matches!(err, CodecError::Malformed(_)), "{err}");
}

#[tokio::test]
async fn test_plain_documents_pass_untouched() {
    let content = vec![para(vec![text("nothing executable here")])];
    assert_eq!(through_json(content.clone(), RpngStrategy::Chunk).await, content);
}
