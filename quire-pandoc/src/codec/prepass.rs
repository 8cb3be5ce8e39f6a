//! Asynchronous stages run around the synchronous transcoders.
//!
//! Both passes first collect work in document order, run all of it
//! concurrently on a [`JoinSet`], then apply the results. There is no
//! concurrency cap: a document with fifty code chunks rasterizes fifty images
//! at once, queued behind the rasterizer's own lock.

use super::meta::{bibliography_paths, read_bibliography};
use super::styles::{CAPTION_CONTENT, CAPTION_LABEL, CODE_CHUNK, CODE_EXPRESSION};
use crate::ast::{Block, Inline, Pandoc};
use crate::error::{CodecError, Result, RpngError};
use crate::math::{same_language, MathTranslator, PandocMath, TARGET_LANGUAGE};
use crate::render::{html, PlaceholderRasterizer, Rasterizer};
use crate::rpng::{self, RpngSettings};
use crate::store::NodeStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quire_schema::{Entity, Math, Node};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Nodes recovered from images and store links, keyed by target URL, and the
/// references read from external bibliographies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    nodes: HashMap<String, Node>,
    references: Vec<Node>,
}

impl Resolved {
    pub fn references(&self) -> &[Node] {
        &self.references
    }

    pub fn add_references(&mut self, references: impl IntoIterator<Item = Node>) {
        self.references.extend(references);
    }

    pub fn get(&self, target: &str) -> Option<&Node> {
        self.nodes.get(target)
    }

    pub fn insert(&mut self, target: impl Into<String>, node: Node) {
        self.nodes.insert(target.into(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct DecodeContext {
    /// Directory relative image paths resolve against.
    pub source_dir: Option<PathBuf>,
    /// Store consulted for links written by the `link` strategy.
    pub store: Option<Arc<dyn NodeStore>>,
    /// Explicit `pandoc-citeproc`, used for bibliographies that are not CSL-JSON.
    pub citeproc_binary: Option<PathBuf>,
}

impl fmt::Debug for DecodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeContext")
            .field("source_dir", &self.source_dir)
            .field("citeproc_binary", &self.citeproc_binary)
            .field("store", &self.store.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct EncodeContext {
    pub rpng: RpngSettings,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub math: Arc<dyn MathTranslator>,
    /// Required by the `link` strategy.
    pub store: Option<Arc<dyn NodeStore>>,
}

impl Default for EncodeContext {
    fn default() -> Self {
        EncodeContext {
            rpng: RpngSettings::default(),
            rasterizer: Arc::new(PlaceholderRasterizer::default()),
            math: Arc::new(PandocMath::default()),
            store: None,
        }
    }
}

impl fmt::Debug for EncodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeContext")
            .field("rpng", &self.rpng)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// Finds the nodes carried by the document's images and store links, and
/// reads the bibliographies named in its metadata.
///
/// Images whose payload sits in their alt text are left to the decoder, which
/// reads them without touching the image bytes.
pub async fn resolve_images(doc: &Pandoc, context: &DecodeContext) -> Result<Resolved> {
    let mut images = BTreeSet::new();
    let mut links = BTreeSet::new();
    visit_blocks(&doc.blocks, &mut |inline| match inline {
        Inline::Image(_, _, (url, title)) if title != rpng::ALT_TEXT_TITLE => {
            images.insert(url.clone());
        }
        Inline::Link(_, _, (url, _)) => {
            if context.store.as_ref().is_some_and(|store| store.owns(url)) {
                links.insert(url.clone());
            }
        }
        _ => {}
    });

    let mut tasks: JoinSet<(String, std::result::Result<Option<Node>, RpngError>)> =
        JoinSet::new();
    for url in images {
        let base = context.source_dir.clone();
        tasks.spawn(async move {
            let result = rpng::sniff_decode(&url, base.as_deref()).await;
            (url, result)
        });
    }
    if let Some(store) = &context.store {
        for url in links {
            let store = Arc::clone(store);
            tasks.spawn_blocking(move || {
                let result = store.get(&url);
                (url, result)
            });
        }
    }

    let mut resolved = Resolved::default();
    for path in bibliography_paths(&doc.meta) {
        resolved.add_references(read_bibliography(&path, context).await);
    }
    while let Some(joined) = tasks.join_next().await {
        let (target, result) = joined?;
        match result {
            Ok(Some(node)) => resolved.insert(target, node),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(target = target.as_str(), error = %err, "ignoring unreadable rpng payload");
            }
        }
    }
    tracing::debug!(count = resolved.len(), "resolved embedded nodes");
    Ok(resolved)
}

/// Rewrites what Pandoc cannot express, returning a fresh tree.
///
/// Math in another notation is translated to TeX; a failed translation empties
/// the math and logs a warning. Code chunks and expressions are rasterized and
/// replaced by rPNG images styled `CodeChunk` / `CodeExpression`.
pub async fn resolve_nodes(node: &Node, context: &EncodeContext) -> Result<Node> {
    let mut tree = node.clone();

    let mut jobs = Vec::new();
    walk_mut(&mut tree, &mut |node| {
        let job = Job::of(node);
        let found = job.is_some();
        jobs.extend(job);
        found
    });
    if jobs.is_empty() {
        return Ok(tree);
    }

    let mut tasks = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let context = context.clone();
        tasks.spawn_blocking(move || (index, job.run(&context)));
    }

    let mut results: Vec<Option<Node>> = vec![None; tasks.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        results[index] = Some(result?);
    }

    let mut results = results.into_iter();
    let mut missing = false;
    walk_mut(&mut tree, &mut |node| {
        if Job::of(node).is_none() {
            return false;
        }
        match results.next().flatten() {
            Some(replacement) => *node = replacement,
            None => missing = true,
        }
        true
    });
    if missing {
        return Err(CodecError::Task("pre-pass result missing".to_string()));
    }
    Ok(tree)
}

enum Job {
    Math { block: bool, math: Math },
    Raster { node: Node, style: &'static str },
}

impl Job {
    fn of(node: &Node) -> Option<Job> {
        match node {
            Node::Entity(Entity::MathBlock(math)) if needs_translation(math) => Some(Job::Math {
                block: true,
                math: math.clone(),
            }),
            Node::Entity(Entity::MathFragment(math)) if needs_translation(math) => {
                Some(Job::Math {
                    block: false,
                    math: math.clone(),
                })
            }
            Node::Entity(Entity::CodeChunk(_)) => Some(Job::Raster {
                node: node.clone(),
                style: CODE_CHUNK,
            }),
            Node::Entity(Entity::CodeExpression(_)) => Some(Job::Raster {
                node: node.clone(),
                style: CODE_EXPRESSION,
            }),
            _ => None,
        }
    }

    fn run(self, context: &EncodeContext) -> std::result::Result<Node, RpngError> {
        match self {
            Job::Math { block, mut math } => {
                let from = math.math_language.clone().unwrap_or_default();
                match context.math.translate(&math.text, &from, TARGET_LANGUAGE) {
                    Ok(text) => math.text = text,
                    Err(err) => {
                        tracing::warn!(error = %err, "math translation failed, emptying it");
                        math.text = String::new();
                    }
                }
                math.math_language = Some(TARGET_LANGUAGE.to_string());
                Ok(Node::Entity(if block {
                    Entity::MathBlock(math)
                } else {
                    Entity::MathFragment(math)
                }))
            }
            Job::Raster { node, style } => {
                let image = context
                    .rasterizer
                    .screenshot(&html::screenshot_request(&node))?;
                let mut embedded =
                    rpng::embed(&node, &image, &context.rpng, context.store.as_deref())?;
                if let Node::Entity(entity) = &mut embedded {
                    let attrs = entity.attrs_mut();
                    attrs.insert("style".to_string(), Node::text(style));
                    // the encoder turns these back into a visible caption
                    if let Node::Entity(Entity::CodeChunk(chunk)) = &node {
                        if let Some(label) = &chunk.label {
                            attrs.insert(CAPTION_LABEL.to_string(), Node::text(label));
                        }
                        if let Some(caption) = &chunk.caption {
                            attrs.insert(CAPTION_CONTENT.to_string(), Node::Array(caption.clone()));
                        }
                    }
                }
                Ok(embedded)
            }
        }
    }
}

/// Replaces images stored under `dir` with data URIs, so the tree no longer
/// depends on the directory.
pub async fn inline_media(tree: &mut Node, dir: &Path) {
    let mut paths = BTreeSet::new();
    walk_mut(tree, &mut |node| {
        if let Node::Entity(Entity::ImageObject(image)) = node {
            if Path::new(&image.content_url).starts_with(dir) {
                paths.insert(image.content_url.clone());
            }
        }
        false
    });

    let mut uris = HashMap::new();
    for path in paths {
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let uri = media_data_uri(Path::new(&path), &bytes);
                uris.insert(path, uri);
            }
            Err(err) => tracing::warn!(path = path.as_str(), error = %err, "cannot inline extracted media"),
        }
    }
    if uris.is_empty() {
        return;
    }
    walk_mut(tree, &mut |node| {
        if let Node::Entity(Entity::ImageObject(image)) = node {
            if let Some(uri) = uris.get(&image.content_url) {
                image.content_url = uri.clone();
            }
        }
        false
    });
}

fn media_data_uri(path: &Path, bytes: &[u8]) -> String {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("emf") => "image/emf",
        Some("wmf") => "image/wmf",
        _ => "application/octet-stream",
    };
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn needs_translation(math: &Math) -> bool {
    math.math_language
        .as_deref()
        .is_some_and(|language| !same_language(language, TARGET_LANGUAGE))
}

/// Visits nodes depth first. Children are skipped when `visit` returns true.
fn walk_mut(node: &mut Node, visit: &mut dyn FnMut(&mut Node) -> bool) {
    if visit(node) {
        return;
    }
    match node {
        Node::Array(items) => items.iter_mut().for_each(|item| walk_mut(item, visit)),
        Node::Object(map) => map.values_mut().for_each(|value| walk_mut(value, visit)),
        Node::Entity(entity) => {
            for child in children_mut(entity) {
                walk_mut(child, visit);
            }
        }
        Node::Null | Node::Boolean(_) | Node::Number(_) | Node::String(_) => {}
    }
}

fn children_mut(entity: &mut Entity) -> Vec<&mut Node> {
    fn all(nodes: &mut [Node]) -> Vec<&mut Node> {
        nodes.iter_mut().collect()
    }
    fn opt(nodes: &mut Option<Vec<Node>>) -> Vec<&mut Node> {
        nodes.as_mut().map(|nodes| all(nodes)).unwrap_or_default()
    }

    match entity {
        Entity::Article(n) => {
            let mut children = opt(&mut n.title);
            children.extend(opt(&mut n.authors));
            children.extend(opt(&mut n.references));
            children.extend(opt(&mut n.content));
            children
        }
        Entity::Heading(n) => all(&mut n.content),
        Entity::Paragraph(n) => all(&mut n.content),
        Entity::QuoteBlock(n) => all(&mut n.content),
        Entity::List(n) => all(&mut n.items),
        Entity::ListItem(n) => all(&mut n.content),
        Entity::Table(n) => {
            let mut children = all(&mut n.rows);
            children.extend(opt(&mut n.caption));
            children
        }
        Entity::TableRow(n) => all(&mut n.cells),
        Entity::TableCell(n) => all(&mut n.content),
        Entity::Figure(n) => {
            let mut children = all(&mut n.content);
            children.extend(opt(&mut n.caption));
            children
        }
        Entity::Collection(n) => all(&mut n.parts),
        Entity::Emphasis(n)
        | Entity::Strong(n)
        | Entity::Delete(n)
        | Entity::Subscript(n)
        | Entity::Superscript(n) => all(&mut n.content),
        Entity::Quote(n) => all(&mut n.content),
        Entity::Link(n) => all(&mut n.content),
        Entity::Cite(n) => {
            let mut children = opt(&mut n.citation_prefix);
            children.extend(opt(&mut n.citation_suffix));
            children.extend(opt(&mut n.content));
            children
        }
        Entity::CiteGroup(n) => all(&mut n.items),
        Entity::ImageObject(n) => opt(&mut n.caption),
        Entity::Note(n) => all(&mut n.content),
        Entity::CodeChunk(n) => {
            let mut children = opt(&mut n.outputs);
            children.extend(opt(&mut n.caption));
            children
        }
        Entity::CodeExpression(n) => n.output.as_deref_mut().into_iter().collect(),
        Entity::Person(_)
        | Entity::CodeBlock(_)
        | Entity::CodeFragment(_)
        | Entity::ThematicBreak(_)
        | Entity::MathBlock(_)
        | Entity::MathFragment(_) => Vec::new(),
    }
}

fn visit_blocks(blocks: &[Block], visit: &mut dyn FnMut(&Inline)) {
    for block in blocks {
        match block {
            Block::Plain(inlines) | Block::Para(inlines) | Block::Header(_, _, inlines) => {
                visit_inlines(inlines, visit)
            }
            Block::BlockQuote(blocks) | Block::Div(_, blocks) => visit_blocks(blocks, visit),
            Block::OrderedList(_, items) | Block::BulletList(items) => {
                items.iter().for_each(|item| visit_blocks(item, visit))
            }
            Block::Table(caption, _, _, header, rows) => {
                visit_inlines(caption, visit);
                header.iter().for_each(|cell| visit_blocks(cell, visit));
                rows.iter()
                    .flatten()
                    .for_each(|cell| visit_blocks(cell, visit));
            }
            Block::CodeBlock(..)
            | Block::RawBlock(..)
            | Block::HorizontalRule
            | Block::Null
            | Block::Unknown(_) => {}
        }
    }
}

fn visit_inlines(inlines: &[Inline], visit: &mut dyn FnMut(&Inline)) {
    for inline in inlines {
        visit(inline);
        match inline {
            Inline::Emph(inner)
            | Inline::Strong(inner)
            | Inline::Strikeout(inner)
            | Inline::Superscript(inner)
            | Inline::Subscript(inner)
            | Inline::SmallCaps(inner)
            | Inline::Quoted(_, inner)
            | Inline::Link(_, inner, _)
            | Inline::Image(_, inner, _)
            | Inline::Span(_, inner) => visit_inlines(inner, visit),
            Inline::Cite(citations, inner) => {
                for citation in citations {
                    visit_inlines(&citation.citation_prefix, visit);
                    visit_inlines(&citation.citation_suffix, visit);
                }
                visit_inlines(inner, visit);
            }
            Inline::Note(blocks) => visit_blocks(blocks, visit),
            Inline::Str(_)
            | Inline::Code(..)
            | Inline::Space
            | Inline::SoftBreak
            | Inline::LineBreak
            | Inline::Math(..)
            | Inline::RawInline(..)
            | Inline::Unknown(_) => {}
        }
    }
}
