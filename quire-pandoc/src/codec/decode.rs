//! Pandoc AST -> node graph.
//!
//! The inverse of [`encode`](super::encode), plus what foreign documents bring:
//!
//! - Images and links resolved by [`resolve_images`](super::prepass::resolve_images)
//!   are replaced by the nodes they carry. A paragraph holding nothing but such
//!   a block node decodes to the node itself.
//! - A `CodeChunkCaption` following a code chunk's container sets the chunk's
//!   label and caption, overriding those in its payload.
//! - `Div`s and `Span`s are unwrapped: a single child receives the container's
//!   attributes (minus meaningless and reserved styles); several children are
//!   spliced into the parent.
//! - Adjacent `Str`, `Space`, `SoftBreak` and `LineBreak` runs coalesce into
//!   one string.
//! - An entirely empty table header row is dropped.
//! - `RawBlock`, `RawInline` and `SmallCaps` are lossy: their content is kept,
//!   their markup is not.
//! - Elements unknown to this version log an error; blocks decode to an empty
//!   paragraph, inlines to nothing.

use super::encode::{is_block, CHECKED, UNCHECKED};
use super::meta::decode_meta;
use super::prepass::Resolved;
use super::styles::{
    self, CODE_CHUNK, CODE_CHUNK_CAPTION, COLLECTION, FIGURE, FIGURE_CAPTION, TABLE_CAPTION,
};
use crate::ast::{self, Attr, Block, Inline, MathType, Pandoc, QuoteType};
use crate::attrs::{decode_attrs, to_node_attrs, AttrMap, STYLE_RENAMES};
use crate::math::TARGET_LANGUAGE;
use crate::rpng;
use quire_schema::{
    Attributes, Cite, CiteGroup, CitationMode, CodeBlock, CodeFragment, Collection, Entity,
    Figure, Heading, ImageObject, Link, List, ListItem, ListOrder, Mark, Math, Node, Note,
    Paragraph, Quote, QuoteBlock, Table, TableCell, TableRow, TableRowType, ThematicBreak,
};

/// Decodes a Pandoc document into an `Article`.
pub fn decode_document(doc: &Pandoc, resolved: &Resolved) -> Node {
    let decoder = Decoder::new(resolved);
    let mut article = decode_meta(&doc.meta, &decoder);
    let content = decoder.blocks(&doc.blocks);
    article.content = Some(content);
    Node::Entity(Entity::Article(article))
}

pub(crate) struct Decoder<'a> {
    resolved: &'a Resolved,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(resolved: &'a Resolved) -> Self {
        Decoder { resolved }
    }

    pub(crate) fn resolved(&self) -> &Resolved {
        self.resolved
    }

    pub(crate) fn blocks(&self, blocks: &[Block]) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut iter = blocks.iter().peekable();
        while let Some(block) = iter.next() {
            match block {
                Block::Div(attr, children) if style_of(attr) == Some(TABLE_CAPTION) => {
                    let (label, caption) = self.caption(children);
                    let mut next = iter.next().map(|block| self.block(block)).unwrap_or_default();
                    match next.as_mut_slice() {
                        [Node::Entity(Entity::Table(table))] => {
                            table.label = label;
                            table.caption = caption;
                        }
                        _ => {
                            tracing::warn!("table caption without a table");
                            nodes.extend(caption.unwrap_or_default());
                        }
                    }
                    nodes.extend(next);
                }
                Block::Div(attr, children) if style_of(attr) == Some(FIGURE) => {
                    let mut figure = Figure {
                        content: self.blocks(children),
                        attrs: container_attrs(attr),
                        ..Default::default()
                    };
                    if let Some(Block::Div(caption_attr, caption)) = iter.peek() {
                        if style_of(caption_attr) == Some(FIGURE_CAPTION) {
                            (figure.label, figure.caption) = self.caption(caption);
                            iter.next();
                        }
                    }
                    nodes.push(Node::Entity(Entity::Figure(figure)));
                }
                Block::Div(attr, _) if style_of(attr) == Some(CODE_CHUNK) => {
                    let mut decoded = self.block(block);
                    if let Some(Block::Div(caption_attr, caption)) = iter.peek() {
                        if style_of(caption_attr) == Some(CODE_CHUNK_CAPTION) {
                            let (label, caption) = self.caption(caption);
                            iter.next();
                            match decoded.as_mut_slice() {
                                [Node::Entity(Entity::CodeChunk(chunk))] => {
                                    // the visible caption may have been edited
                                    chunk.label = label;
                                    chunk.caption = caption;
                                }
                                _ => {
                                    tracing::warn!("code chunk caption without a code chunk");
                                    decoded.extend(caption.unwrap_or_default());
                                }
                            }
                        }
                    }
                    nodes.extend(decoded);
                }
                Block::Div(attr, children)
                    if style_of(attr) == Some(FIGURE_CAPTION)
                        || style_of(attr) == Some(CODE_CHUNK_CAPTION) =>
                {
                    tracing::warn!("caption without its content");
                    let (_, caption) = self.caption(children);
                    nodes.extend(caption.unwrap_or_default());
                }
                _ => nodes.extend(self.block(block)),
            }
        }
        nodes
    }

    fn block(&self, block: &Block) -> Vec<Node> {
        let node = match block {
            Block::Plain(inlines) => return self.plain(inlines),
            Block::Para(inlines) => {
                if let [Inline::Math(MathType::DisplayMath, text)] = inlines.as_slice() {
                    Entity::MathBlock(tex(text))
                } else {
                    return self.paragraph(inlines);
                }
            }
            Block::CodeBlock(attr, text) => {
                let (programming_language, attrs) = code_attrs(attr);
                Entity::CodeBlock(CodeBlock {
                    text: text.clone(),
                    programming_language,
                    attrs,
                })
            }
            Block::RawBlock(format, text) => {
                tracing::warn!(format = format.as_str(), "raw block kept as a code block");
                Entity::CodeBlock(CodeBlock {
                    text: text.clone(),
                    programming_language: Some(format.clone()),
                    attrs: Attributes::new(),
                })
            }
            Block::BlockQuote(blocks) => Entity::QuoteBlock(QuoteBlock {
                content: self.blocks(blocks),
                attrs: Attributes::new(),
            }),
            Block::OrderedList(_, items) => self.list(items, ListOrder::Ascending),
            Block::BulletList(items) => self.list(items, ListOrder::Unordered),
            Block::Header(depth, attr, inlines) => Entity::Heading(Heading {
                depth: *depth,
                content: self.inlines(inlines),
                attrs: attrs_of(attr),
            }),
            Block::HorizontalRule => Entity::ThematicBreak(ThematicBreak::default()),
            Block::Table(caption, _, _, header, rows) => self.table(caption, header, rows),
            Block::Div(attr, children) if style_of(attr) == Some(COLLECTION) => {
                Entity::Collection(Collection {
                    parts: self.blocks(children),
                    attrs: container_attrs(attr),
                })
            }
            Block::Div(attr, children) => return unwrap(attr, self.blocks(children)),
            Block::Null => return Vec::new(),
            Block::Unknown(tag) => {
                tracing::error!(kind = tag.as_str(), "unknown block, decoding as an empty paragraph");
                Entity::Paragraph(Paragraph::default())
            }
        };
        vec![Node::Entity(node)]
    }

    /// `Plain` holds tight content: a lone image stays a block-level image.
    fn plain(&self, inlines: &[Inline]) -> Vec<Node> {
        let nodes = self.inlines(inlines);
        if matches!(nodes.as_slice(), [Node::Entity(Entity::ImageObject(_))]) {
            return nodes;
        }
        self.wrap_paragraph(nodes)
    }

    fn paragraph(&self, inlines: &[Inline]) -> Vec<Node> {
        let nodes = self.inlines(inlines);
        self.wrap_paragraph(nodes)
    }

    fn wrap_paragraph(&self, nodes: Vec<Node>) -> Vec<Node> {
        if matches!(nodes.as_slice(), [node] if is_block(node)) {
            return nodes;
        }
        vec![Node::Entity(Entity::Paragraph(Paragraph::new(nodes)))]
    }

    fn list(&self, items: &[Vec<Block>], order: ListOrder) -> Entity {
        let items = items
            .iter()
            .map(|blocks| {
                let mut blocks = blocks.clone();
                let is_checked = take_task_marker(&mut blocks);
                Node::Entity(Entity::ListItem(ListItem {
                    content: self.blocks(&blocks),
                    is_checked,
                    attrs: Attributes::new(),
                }))
            })
            .collect();
        Entity::List(List {
            items,
            order,
            attrs: Attributes::new(),
        })
    }

    fn table(
        &self,
        caption: &[Inline],
        header: &[ast::TableCell],
        rows: &[Vec<ast::TableCell>],
    ) -> Entity {
        let mut table_rows = Vec::new();
        if header.iter().any(|cell| !cell.is_empty()) {
            table_rows.push(self.row(header, Some(TableRowType::Header)));
        }
        table_rows.extend(rows.iter().map(|row| self.row(row, None)));
        let caption = self.inlines(caption);
        Entity::Table(Table {
            rows: table_rows,
            caption: (!caption.is_empty())
                .then(|| vec![Node::Entity(Entity::Paragraph(Paragraph::new(caption)))]),
            ..Default::default()
        })
    }

    fn row(&self, cells: &[ast::TableCell], row_type: Option<TableRowType>) -> Node {
        let cells = cells
            .iter()
            .map(|blocks| {
                let inlines = join_block_inlines(blocks);
                Node::Entity(Entity::TableCell(TableCell {
                    content: self.inlines(&inlines),
                    attrs: Attributes::new(),
                }))
            })
            .collect();
        Node::Entity(Entity::TableRow(TableRow {
            cells,
            row_type,
            attrs: Attributes::new(),
        }))
    }

    /// Splits `"{label}. {caption}"` back into its parts.
    fn caption(&self, blocks: &[Block]) -> (Option<String>, Option<Vec<Node>>) {
        let inlines = join_block_inlines(blocks);
        let mut rest = inlines.as_slice();
        let mut label = None;
        if let [Inline::Strong(strong), tail @ ..] = rest {
            let text = plain_text(strong);
            if let Some(stripped) = text.strip_suffix('.') {
                match tail {
                    [] => {
                        label = Some(stripped.to_string());
                        rest = tail;
                    }
                    [Inline::Space, after @ ..] => {
                        label = Some(stripped.to_string());
                        rest = after;
                    }
                    _ => {}
                }
            }
        }
        let content = self.inlines(rest);
        let caption = (!content.is_empty())
            .then(|| vec![Node::Entity(Entity::Paragraph(Paragraph::new(content)))]);
        (label, caption)
    }

    pub(crate) fn inlines(&self, inlines: &[Inline]) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        for inline in inlines {
            match inline {
                Inline::Str(value) => text.push_str(value),
                Inline::Space | Inline::SoftBreak => text.push(' '),
                Inline::LineBreak => text.push('\n'),
                other => {
                    let decoded = self.inline(other);
                    if decoded.is_empty() {
                        continue;
                    }
                    if !text.is_empty() {
                        nodes.push(Node::String(std::mem::take(&mut text)));
                    }
                    nodes.extend(decoded);
                }
            }
        }
        if !text.is_empty() {
            nodes.push(Node::String(text));
        }
        nodes
    }

    fn inline(&self, inline: &Inline) -> Vec<Node> {
        let entity = match inline {
            Inline::Str(value) => return vec![Node::String(value.clone())],
            Inline::Space | Inline::SoftBreak => return vec![Node::text(" ")],
            Inline::LineBreak => return vec![Node::text("\n")],
            Inline::Emph(inlines) => Entity::Emphasis(self.mark(inlines)),
            Inline::Strong(inlines) => Entity::Strong(self.mark(inlines)),
            Inline::Strikeout(inlines) => Entity::Delete(self.mark(inlines)),
            Inline::Superscript(inlines) => Entity::Superscript(self.mark(inlines)),
            Inline::Subscript(inlines) => Entity::Subscript(self.mark(inlines)),
            Inline::SmallCaps(inlines) => {
                tracing::warn!(kind = "SmallCaps", "small caps kept as plain text");
                return self.inlines(inlines);
            }
            Inline::Quoted(quote_type, inlines) => {
                let mut attrs = Attributes::new();
                if *quote_type == QuoteType::SingleQuote {
                    attrs.insert("quote".to_string(), Node::text("single"));
                }
                Entity::Quote(Quote {
                    content: self.inlines(inlines),
                    cite: None,
                    attrs,
                })
            }
            Inline::Cite(citations, content) => return self.cite(citations, content),
            Inline::Code(attr, text) => {
                let (programming_language, attrs) = code_attrs(attr);
                Entity::CodeFragment(CodeFragment {
                    text: text.clone(),
                    programming_language,
                    attrs,
                })
            }
            Inline::Math(_, text) => Entity::MathFragment(tex(text)),
            Inline::RawInline(format, text) => {
                tracing::warn!(format = format.as_str(), "raw inline kept as text");
                return vec![Node::String(text.clone())];
            }
            Inline::Link(attr, content, (target, title)) => {
                if let Some(node) = self.resolved.get(target) {
                    return vec![node.clone()];
                }
                Entity::Link(Link {
                    content: self.inlines(content),
                    target: target.clone(),
                    title: non_empty(title),
                    attrs: attrs_of(attr),
                })
            }
            Inline::Image(attr, alt, (url, title)) => {
                if let Some(node) = rpng::decode_alt_text(title, &plain_text(alt)) {
                    return vec![node];
                }
                if let Some(node) = self.resolved.get(url) {
                    return vec![node.clone()];
                }
                let caption = self.inlines(alt);
                Entity::ImageObject(ImageObject {
                    content_url: url.clone(),
                    caption: (!caption.is_empty()).then_some(caption),
                    title: non_empty(title),
                    attrs: attrs_of(attr),
                })
            }
            Inline::Note(blocks) => Entity::Note(Note {
                content: self.blocks(blocks),
                attrs: Attributes::new(),
            }),
            Inline::Span(attr, inlines) => return unwrap(attr, self.inlines(inlines)),
            Inline::Unknown(tag) => {
                tracing::error!(kind = tag.as_str(), "unknown inline, skipping it");
                return Vec::new();
            }
        };
        vec![Node::Entity(entity)]
    }

    fn mark(&self, inlines: &[Inline]) -> Mark {
        Mark::new(self.inlines(inlines))
    }

    /// One citation decodes to a `Cite`, several to a `CiteGroup`.
    fn cite(&self, citations: &[ast::Citation], content: &[Inline]) -> Vec<Node> {
        let mut cites: Vec<Cite> = citations.iter().map(|c| self.citation(c)).collect();
        let node = match cites.len() {
            0 => return self.inlines(content),
            1 => {
                let mut cite = cites.remove(0);
                let content = self.inlines(content);
                cite.content = (!content.is_empty()).then_some(content);
                Entity::Cite(cite)
            }
            _ => Entity::CiteGroup(CiteGroup {
                items: cites
                    .into_iter()
                    .map(|cite| Node::Entity(Entity::Cite(cite)))
                    .collect(),
                attrs: Attributes::new(),
            }),
        };
        vec![Node::Entity(node)]
    }

    fn citation(&self, citation: &ast::Citation) -> Cite {
        let inlines = |inlines: &[Inline]| {
            let nodes = self.inlines(inlines);
            (!nodes.is_empty()).then_some(nodes)
        };
        Cite {
            target: citation.citation_id.clone(),
            citation_mode: match citation.citation_mode {
                ast::CitationMode::AuthorInText => CitationMode::Narrative,
                ast::CitationMode::SuppressAuthor => CitationMode::NarrativeYear,
                ast::CitationMode::NormalCitation => CitationMode::Parenthetical,
            },
            citation_prefix: inlines(&citation.citation_prefix),
            citation_suffix: inlines(&citation.citation_suffix),
            content: None,
            attrs: Attributes::new(),
        }
    }
}

/// Splices a container's children into its parent, handing the container's
/// attributes to a lone child entity.
fn unwrap(attr: &Attr, mut children: Vec<Node>) -> Vec<Node> {
    let attrs = filtered_attrs(attr);
    let count = children.len();
    match children.as_mut_slice() {
        [Node::Entity(entity)] => {
            let bag = entity.attrs_mut();
            for (key, value) in attrs {
                bag.entry(key).or_insert(Node::String(value));
            }
        }
        _ if !attrs.is_empty() => {
            tracing::debug!(
                children = count,
                "dropping container attributes of several children"
            );
        }
        _ => {}
    }
    children
}

fn filtered_attrs(attr: &Attr) -> AttrMap {
    let mut attrs = decode_attrs(attr, STYLE_RENAMES).unwrap_or_default();
    if attrs
        .get("style")
        .is_some_and(|style| styles::is_filtered(style))
    {
        attrs.remove("style");
    }
    attrs
}

fn container_attrs(attr: &Attr) -> Attributes {
    to_node_attrs(filtered_attrs(attr))
}

fn attrs_of(attr: &Attr) -> Attributes {
    decode_attrs(attr, STYLE_RENAMES)
        .map(to_node_attrs)
        .unwrap_or_default()
}

/// First class is the language, the rest stay classes.
fn code_attrs(attr: &Attr) -> (Option<String>, Attributes) {
    let mut attrs = decode_attrs(attr, STYLE_RENAMES).unwrap_or_default();
    let mut language = None;
    if let Some(classes) = attrs.remove("classes") {
        let mut classes = classes.split_whitespace();
        language = classes.next().map(str::to_string);
        let rest = classes.collect::<Vec<_>>().join(" ");
        if !rest.is_empty() {
            attrs.insert("classes".to_string(), rest);
        }
    }
    (language, to_node_attrs(attrs))
}

fn style_of(attr: &Attr) -> Option<&str> {
    attr.2
        .iter()
        .find(|(key, _)| STYLE_RENAMES.iter().any(|(wire, _)| wire == key))
        .map(|(_, value)| value.as_str())
}

fn tex(text: &str) -> Math {
    Math {
        text: text.to_string(),
        math_language: Some(TARGET_LANGUAGE.to_string()),
        attrs: Attributes::new(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn join_block_inlines(blocks: &[Block]) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for block in blocks {
        if let Block::Para(content) | Block::Plain(content) = block {
            if !inlines.is_empty() {
                inlines.push(Inline::Space);
            }
            inlines.extend(content.iter().cloned());
        }
    }
    inlines
}

/// Removes a leading task list marker, returning whether it was checked.
fn take_task_marker(blocks: &mut Vec<Block>) -> Option<bool> {
    let Some(Block::Plain(inlines) | Block::Para(inlines)) = blocks.first_mut() else {
        return None;
    };
    let checked = match inlines.first() {
        Some(Inline::Str(marker)) if marker == CHECKED => true,
        Some(Inline::Str(marker)) if marker == UNCHECKED => false,
        _ => return None,
    };
    let skip = if matches!(inlines.get(1), Some(Inline::Space)) { 2 } else { 1 };
    inlines.drain(..skip);
    if inlines.is_empty() {
        blocks.remove(0);
    }
    Some(checked)
}

/// Flattens Pandoc inlines to text, keeping quotes and code.
pub(crate) fn plain_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Str(value) => text.push_str(value),
            Inline::Space | Inline::SoftBreak => text.push(' '),
            Inline::LineBreak => text.push('\n'),
            Inline::Quoted(QuoteType::DoubleQuote, inner) => {
                text.push('"');
                text.push_str(&plain_text(inner));
                text.push('"');
            }
            Inline::Quoted(QuoteType::SingleQuote, inner) => {
                text.push('\'');
                text.push_str(&plain_text(inner));
                text.push('\'');
            }
            Inline::Code(_, code) | Inline::Math(_, code) | Inline::RawInline(_, code) => {
                text.push_str(code)
            }
            Inline::Emph(inner)
            | Inline::Strong(inner)
            | Inline::Strikeout(inner)
            | Inline::Superscript(inner)
            | Inline::Subscript(inner)
            | Inline::SmallCaps(inner)
            | Inline::Cite(_, inner)
            | Inline::Link(_, inner, _)
            | Inline::Image(_, inner, _)
            | Inline::Span(_, inner) => text.push_str(&plain_text(inner)),
            Inline::Note(_) | Inline::Unknown(_) => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Meta;

    fn decode_blocks(blocks: Vec<Block>) -> Vec<Node> {
        let resolved = Resolved::default();
        Decoder::new(&resolved).blocks(&blocks)
    }

    fn word(value: &str) -> Inline {
        Inline::Str(value.to_string())
    }

    fn attr(id: &str, pairs: &[(&str, &str)]) -> Attr {
        (
            id.to_string(),
            Vec::new(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn coalesces_text_runs() {
        let nodes = decode_blocks(vec![Block::Para(vec![
            word("line"),
            Inline::SoftBreak,
            word("wrapped"),
            Inline::Space,
            word("text"),
        ])]);
        assert_eq!(
            nodes,
            vec![Node::Entity(Entity::Paragraph(Paragraph::new(vec![
                Node::text("line wrapped text")
            ])))]
        );
    }

    #[test]
    fn div_attributes_merge_into_single_child() {
        let nodes = decode_blocks(vec![Block::Div(
            attr("intro", &[("custom-style", "Body Text"), ("lang", "en")]),
            vec![Block::Para(vec![word("Hi")])],
        )]);
        let Node::Entity(Entity::Paragraph(para)) = &nodes[0] else {
            panic!("expected paragraph, got {nodes:?}");
        };
        assert_eq!(para.attrs.get("id"), Some(&Node::text("intro")));
        assert_eq!(para.attrs.get("lang"), Some(&Node::text("en")));
        assert!(!para.attrs.contains_key("style"));
    }

    #[test]
    fn div_with_several_children_is_flattened() {
        let nodes = decode_blocks(vec![Block::Div(
            attr("", &[]),
            vec![Block::Para(vec![word("a")]), Block::HorizontalRule],
        )]);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn unknown_block_becomes_empty_paragraph() {
        let nodes = decode_blocks(vec![Block::Unknown("Figure".to_string())]);
        assert_eq!(nodes, vec![Node::Entity(Entity::Paragraph(Paragraph::default()))]);
    }

    #[test]
    fn unknown_inlines_leave_no_trace() {
        let resolved = Resolved::default();
        let nodes = Decoder::new(&resolved).inlines(&[
            word("before"),
            Inline::Unknown("Underline".to_string()),
            Inline::Space,
            word("after"),
        ]);
        assert_eq!(nodes, vec![Node::text("before after")]);
    }

    #[test]
    fn empty_header_row_is_dropped() {
        let nodes = decode_blocks(vec![Block::Table(
            Vec::new(),
            vec![ast::Alignment::AlignDefault; 2],
            vec![0.0; 2],
            vec![Vec::new(), Vec::new()],
            vec![vec![
                vec![Block::Plain(vec![word("a")])],
                vec![Block::Plain(vec![word("b")])],
            ]],
        )]);
        let Node::Entity(Entity::Table(table)) = &nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn citation_cardinality() {
        let citation = |id: &str| ast::Citation {
            citation_id: id.to_string(),
            citation_prefix: Vec::new(),
            citation_suffix: Vec::new(),
            citation_mode: ast::CitationMode::SuppressAuthor,
            citation_note_num: 0,
            citation_hash: 0,
        };
        let resolved = Resolved::default();
        let decoder = Decoder::new(&resolved);

        let single = decoder.inlines(&[Inline::Cite(vec![citation("a")], Vec::new())]);
        let Node::Entity(Entity::Cite(cite)) = &single[0] else {
            panic!("expected cite");
        };
        assert_eq!(cite.citation_mode, CitationMode::NarrativeYear);

        let group = decoder.inlines(&[Inline::Cite(
            vec![citation("a"), citation("b"), citation("c")],
            Vec::new(),
        )]);
        let Node::Entity(Entity::CiteGroup(group)) = &group[0] else {
            panic!("expected cite group");
        };
        assert_eq!(group.items.len(), 3);
    }

    #[test]
    fn task_markers_become_checked_flags() {
        let nodes = decode_blocks(vec![Block::BulletList(vec![
            vec![Block::Plain(vec![word(CHECKED), Inline::Space, word("done")])],
            vec![Block::Plain(vec![word("plain")])],
        ])]);
        let Node::Entity(Entity::List(list)) = &nodes[0] else {
            panic!("expected list");
        };
        let checked: Vec<_> = list
            .items
            .iter()
            .map(|item| match item {
                Node::Entity(Entity::ListItem(item)) => item.is_checked,
                _ => None,
            })
            .collect();
        assert_eq!(checked, vec![Some(true), None]);
    }

    #[test]
    fn documents_decode_to_articles() {
        let doc = Pandoc::new(Meta::new(), vec![Block::HorizontalRule]);
        let node = decode_document(&doc, &Resolved::default());
        let Node::Entity(Entity::Article(article)) = node else {
            panic!("expected article");
        };
        assert_eq!(article.content.map(|c| c.len()), Some(1));
    }
}
