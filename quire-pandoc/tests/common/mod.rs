//! Shared fixtures: node builders, the synchronous round trip and log capture.

use quire_pandoc::ast;
use quire_pandoc::codec::{decode_document, encode_node, Resolved};
use quire_schema::{Article, Entity, Mark, Node, Paragraph};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

pub fn text(value: &str) -> Node {
    Node::text(value)
}

pub fn para(content: Vec<Node>) -> Node {
    Node::Entity(Entity::Paragraph(Paragraph::new(content)))
}

pub fn strong(content: Vec<Node>) -> Node {
    Node::Entity(Entity::Strong(Mark::new(content)))
}

pub fn article(content: Vec<Node>) -> Node {
    Node::Entity(Entity::Article(Article {
        content: Some(content),
        ..Default::default()
    }))
}

/// The content of an article, panicking on anything else.
pub fn content_of(node: Node) -> Vec<Node> {
    match node {
        Node::Entity(Entity::Article(article)) => article.content.unwrap_or_default(),
        other => panic!("expected an article, got {other:?}"),
    }
}

/// Encodes content, goes through Pandoc JSON text and decodes it again.
pub fn round_trip(content: Vec<Node>) -> Vec<Node> {
    let doc = encode_node(&article(content));
    let json = ast::to_json(&doc).expect("serialise");
    let parsed = ast::parse(&json).expect("reparse");
    content_of(decode_document(&parsed, &Resolved::default()))
}

#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber recording events at WARN and above.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.lines())
}
