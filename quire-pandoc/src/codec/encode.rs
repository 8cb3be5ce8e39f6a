//! Node graph -> Pandoc AST.
//!
//! | Node                      | Pandoc                                          |
//! |---------------------------|-------------------------------------------------|
//! | Article                   | meta + blocks                                   |
//! | Heading                   | Header                                          |
//! | Paragraph                 | Para                                            |
//! | QuoteBlock                | BlockQuote                                      |
//! | CodeBlock / CodeFragment  | CodeBlock / Code, language as first class       |
//! | List                      | BulletList / OrderedList                        |
//! | Table                     | `Div TableCaption`, Table                       |
//! | Figure                    | `Div Figure`, `Div FigureCaption`               |
//! | CodeChunk (rasterized)    | `Div CodeChunk`, `Div CodeChunkCaption`         |
//! | Collection                | `Div Collection`                                |
//! | ThematicBreak             | HorizontalRule                                  |
//! | MathBlock / MathFragment  | Para [Math Display] / Math Inline               |
//! | Emphasis, Strong, Delete  | Emph, Strong, Strikeout                         |
//! | Quote                     | Quoted (`quote: single` selects single quotes)  |
//! | Cite / CiteGroup          | Cite with one / several citations               |
//! | ImageObject               | Image (Plain [Image] at block level)            |
//! | Link, Note                | Link, Note                                      |
//!
//! Entities with attributes but no attribute slot in Pandoc are wrapped in a
//! `Div` (blocks) or `Span` (inlines) carrying them.
//!
//! Code chunks and expressions are expected to have been rasterized by
//! [`resolve_nodes`](super::prepass::resolve_nodes); the images it produces
//! carry a reserved style and are wrapped in a container with that style.

use super::meta::encode_meta;
use super::styles::{
    CAPTION_CONTENT, CAPTION_LABEL, CODE_CHUNK, CODE_CHUNK_CAPTION, CODE_EXPRESSION, COLLECTION,
    FIGURE, FIGURE_CAPTION, TABLE_CAPTION,
};
use crate::ast::{
    Alignment, Block, Citation, CitationMode as PandocMode, Inline, ListNumberDelim,
    ListNumberStyle, MathType, Meta, Pandoc, QuoteType, TableCell as PandocCell,
};
use crate::attrs::{encode_attrs_with, from_node_attrs, AttrMap, STYLE_RENAMES};
use crate::math::{same_language, TARGET_LANGUAGE};
use quire_schema::text::format_number;
use quire_schema::{
    Cite, CitationMode, Entity, Figure, List, ListOrder, Node, Table, TableRow, TableRowType,
};

/// Marker prefixed to checked task list items.
pub const CHECKED: &str = "☒";
/// Marker prefixed to unchecked task list items.
pub const UNCHECKED: &str = "☐";

/// Encodes a node into a Pandoc document.
///
/// Articles provide metadata and blocks. Any other block is the document's
/// only block; any other inline becomes the only paragraph.
pub fn encode_node(node: &Node) -> Pandoc {
    match node {
        Node::Entity(Entity::Article(article)) => Pandoc::new(
            encode_meta(article),
            article
                .content
                .as_deref()
                .map(encode_blocks)
                .unwrap_or_default(),
        ),
        _ if is_block(node) || reserved_style(node) == Some(CODE_CHUNK) => {
            Pandoc::new(Meta::new(), encode_block(node))
        }
        _ => Pandoc::new(Meta::new(), vec![Block::Para(encode_inline(node))]),
    }
}

/// Whether a node belongs in block context.
pub fn is_block(node: &Node) -> bool {
    node.as_entity().is_some_and(is_block_entity)
}

fn is_block_entity(entity: &Entity) -> bool {
    matches!(
        entity,
        Entity::Heading(_)
            | Entity::Paragraph(_)
            | Entity::QuoteBlock(_)
            | Entity::CodeBlock(_)
            | Entity::CodeChunk(_)
            | Entity::List(_)
            | Entity::Table(_)
            | Entity::Figure(_)
            | Entity::Collection(_)
            | Entity::ThematicBreak(_)
            | Entity::MathBlock(_)
    )
}

pub(crate) fn encode_blocks(nodes: &[Node]) -> Vec<Block> {
    nodes.iter().flat_map(encode_block).collect()
}

pub(crate) fn encode_block(node: &Node) -> Vec<Block> {
    match node {
        Node::Null => Vec::new(),
        Node::Array(items) => encode_blocks(items),
        Node::Boolean(_) | Node::Number(_) | Node::String(_) => {
            vec![Block::Para(encode_inline(node))]
        }
        Node::Object(_) => vec![fallback_block(node.unknown_type().unwrap_or("Object"))],
        Node::Entity(entity) => encode_block_entity(entity),
    }
}

fn encode_block_entity(entity: &Entity) -> Vec<Block> {
    if let Some(style) = reserved_inline_style(entity) {
        let mut inner = entity.clone();
        let attrs = inner.attrs_mut();
        attrs.remove("style");
        let label = attrs.remove(CAPTION_LABEL);
        let caption = attrs.remove(CAPTION_CONTENT);
        let mut blocks = vec![Block::Div(
            style_attr(style),
            vec![Block::Plain(encode_inline_entity(&inner))],
        )];
        if label.is_some() || caption.is_some() {
            let caption = match caption {
                Some(Node::Array(nodes)) => Some(nodes),
                Some(other) => Some(vec![other]),
                None => None,
            };
            blocks.push(Block::Div(
                style_attr(CODE_CHUNK_CAPTION),
                vec![Block::Para(caption_inlines(
                    label.as_ref().and_then(Node::as_str),
                    caption.as_deref(),
                ))],
            ));
        }
        return blocks;
    }

    let attrs = from_node_attrs(entity.attrs());
    match entity {
        Entity::Heading(heading) => vec![Block::Header(
            heading.depth,
            encode_attrs_with(&attrs, STYLE_RENAMES),
            encode_inlines(&heading.content),
        )],
        Entity::Paragraph(para) => wrap_block(attrs, Block::Para(encode_inlines(&para.content))),
        Entity::QuoteBlock(quote) => {
            wrap_block(attrs, Block::BlockQuote(encode_blocks(&quote.content)))
        }
        Entity::CodeBlock(code) => vec![Block::CodeBlock(
            code_attr(attrs, code.programming_language.as_deref()),
            code.text.clone(),
        )],
        Entity::CodeChunk(chunk) => {
            tracing::warn!(
                kind = "CodeChunk",
                "code chunk was not rasterized, encoding it as a plain code block"
            );
            vec![Block::CodeBlock(
                code_attr(attrs, chunk.programming_language.as_deref()),
                chunk.text.clone(),
            )]
        }
        Entity::List(list) => wrap_block(attrs, encode_list(list)),
        Entity::Table(table) => encode_table(table, attrs),
        Entity::Figure(figure) => encode_figure(figure, attrs),
        Entity::Collection(collection) => vec![Block::Div(
            styled(attrs, COLLECTION),
            encode_blocks(&collection.parts),
        )],
        Entity::ThematicBreak(_) => wrap_block(attrs, Block::HorizontalRule),
        Entity::MathBlock(math) => {
            warn_untranslated(math.math_language.as_deref(), "MathBlock");
            wrap_block(
                attrs,
                Block::Para(vec![Inline::Math(MathType::DisplayMath, math.text.clone())]),
            )
        }
        Entity::ImageObject(_) => vec![Block::Plain(encode_inline_entity(entity))],
        Entity::Emphasis(_)
        | Entity::Strong(_)
        | Entity::Delete(_)
        | Entity::Subscript(_)
        | Entity::Superscript(_)
        | Entity::Quote(_)
        | Entity::CodeFragment(_)
        | Entity::CodeExpression(_)
        | Entity::MathFragment(_)
        | Entity::Link(_)
        | Entity::Cite(_)
        | Entity::CiteGroup(_)
        | Entity::Note(_) => vec![Block::Para(encode_inline_entity(entity))],
        Entity::Article(_)
        | Entity::Person(_)
        | Entity::ListItem(_)
        | Entity::TableRow(_)
        | Entity::TableCell(_) => vec![fallback_block(entity.kind())],
    }
}

fn encode_list(list: &List) -> Block {
    let items = list.items.iter().map(encode_list_item).collect();
    match list.order {
        ListOrder::Unordered => Block::BulletList(items),
        ListOrder::Ascending => {
            Block::OrderedList((1, ListNumberStyle::Decimal, ListNumberDelim::Period), items)
        }
        ListOrder::Descending => {
            tracing::warn!(kind = "List", "descending order is written as ascending");
            Block::OrderedList((1, ListNumberStyle::Decimal, ListNumberDelim::Period), items)
        }
    }
}

fn encode_list_item(node: &Node) -> Vec<Block> {
    let Node::Entity(Entity::ListItem(item)) = node else {
        return encode_block(node);
    };
    let mut blocks = encode_blocks(&item.content);
    if let Some(checked) = item.is_checked {
        let marker = Inline::Str(if checked { CHECKED } else { UNCHECKED }.to_string());
        match blocks.first_mut() {
            Some(Block::Para(inlines) | Block::Plain(inlines)) => {
                inlines.splice(0..0, [marker, Inline::Space]);
            }
            _ => blocks.insert(0, Block::Plain(vec![marker])),
        }
    }
    blocks
}

fn encode_table(table: &Table, attrs: AttrMap) -> Vec<Block> {
    let rows: Vec<&TableRow> = table
        .rows
        .iter()
        .filter_map(|row| match row {
            Node::Entity(Entity::TableRow(row)) => Some(row),
            other => {
                tracing::warn!(kind = other.kind(), "dropping table row that is not a TableRow");
                None
            }
        })
        .collect();
    let columns = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
    let header_index = rows
        .iter()
        .position(|row| row.row_type == Some(TableRowType::Header));

    let header = match header_index {
        Some(index) => encode_row(rows[index], columns),
        None => vec![Vec::new(); columns],
    };
    let body = rows
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != header_index)
        .map(|(_, row)| encode_row(row, columns))
        .collect();

    let mut blocks = Vec::new();
    if table.label.is_some() || table.caption.is_some() {
        blocks.push(Block::Div(
            style_attr(TABLE_CAPTION),
            vec![Block::Para(caption_inlines(
                table.label.as_deref(),
                table.caption.as_deref(),
            ))],
        ));
    }
    blocks.extend(wrap_block(
        attrs,
        Block::Table(
            Vec::new(),
            vec![Alignment::AlignDefault; columns],
            vec![0.0; columns],
            header,
            body,
        ),
    ));
    blocks
}

fn encode_row(row: &TableRow, columns: usize) -> Vec<PandocCell> {
    let mut cells: Vec<PandocCell> = row
        .cells
        .iter()
        .map(|cell| match cell {
            Node::Entity(Entity::TableCell(cell)) if cell.content.is_empty() => Vec::new(),
            Node::Entity(Entity::TableCell(cell)) => {
                vec![Block::Plain(encode_inlines(&cell.content))]
            }
            other => vec![Block::Plain(encode_inline(other))],
        })
        .collect();
    cells.resize(columns, Vec::new());
    cells
}

fn encode_figure(figure: &Figure, attrs: AttrMap) -> Vec<Block> {
    let mut blocks = vec![Block::Div(
        styled(attrs, FIGURE),
        encode_blocks(&figure.content),
    )];
    if figure.label.is_some() || figure.caption.is_some() {
        blocks.push(Block::Div(
            style_attr(FIGURE_CAPTION),
            vec![Block::Para(caption_inlines(
                figure.label.as_deref(),
                figure.caption.as_deref(),
            ))],
        ));
    }
    blocks
}

/// `"{label}. {caption}"`, with the label in bold and caption headings demoted
/// to bold runs.
fn caption_inlines(label: Option<&str>, caption: Option<&[Node]>) -> Vec<Inline> {
    let mut inlines = Vec::new();
    if let Some(label) = label {
        inlines.push(Inline::Strong(vec![Inline::Str(format!("{label}."))]));
    }
    for node in caption.unwrap_or_default() {
        let part = match node {
            Node::Entity(Entity::Heading(heading)) => {
                vec![Inline::Strong(encode_inlines(&heading.content))]
            }
            Node::Entity(Entity::Paragraph(para)) => encode_inlines(&para.content),
            other if is_block(other) => {
                tracing::warn!(kind = other.kind(), "dropping block from caption");
                Vec::new()
            }
            other => encode_inline(other),
        };
        if part.is_empty() {
            continue;
        }
        if !inlines.is_empty() {
            inlines.push(Inline::Space);
        }
        inlines.extend(part);
    }
    inlines
}

pub(crate) fn encode_inlines(nodes: &[Node]) -> Vec<Inline> {
    nodes.iter().flat_map(encode_inline).collect()
}

pub(crate) fn encode_inline(node: &Node) -> Vec<Inline> {
    match node {
        Node::Null => Vec::new(),
        Node::Boolean(value) => vec![Inline::Str(value.to_string())],
        Node::Number(value) => vec![Inline::Str(format_number(*value))],
        Node::String(text) => encode_text(text),
        Node::Array(items) => encode_inlines(items),
        Node::Object(_) => vec![fallback_inline(node.unknown_type().unwrap_or("Object"))],
        Node::Entity(entity) => match reserved_inline_style(entity) {
            Some(style) => {
                let mut inner = entity.clone();
                let attrs = inner.attrs_mut();
                attrs.remove("style");
                let label = attrs.remove(CAPTION_LABEL);
                let caption = attrs.remove(CAPTION_CONTENT);
                if label.is_some() || caption.is_some() {
                    tracing::warn!(kind = style, "dropping caption of code in inline context");
                }
                vec![Inline::Span(style_attr(style), encode_inline_entity(&inner))]
            }
            None => encode_inline_entity(entity),
        },
    }
}

fn encode_inline_entity(entity: &Entity) -> Vec<Inline> {
    let mut attrs = from_node_attrs(entity.attrs());
    match entity {
        Entity::Emphasis(mark) => wrap_inline(attrs, Inline::Emph(encode_inlines(&mark.content))),
        Entity::Strong(mark) => wrap_inline(attrs, Inline::Strong(encode_inlines(&mark.content))),
        Entity::Delete(mark) => {
            wrap_inline(attrs, Inline::Strikeout(encode_inlines(&mark.content)))
        }
        Entity::Subscript(mark) => {
            wrap_inline(attrs, Inline::Subscript(encode_inlines(&mark.content)))
        }
        Entity::Superscript(mark) => {
            wrap_inline(attrs, Inline::Superscript(encode_inlines(&mark.content)))
        }
        Entity::Quote(quote) => {
            let quote_type = match attrs.remove("quote").as_deref() {
                Some("single") => QuoteType::SingleQuote,
                _ => QuoteType::DoubleQuote,
            };
            wrap_inline(
                attrs,
                Inline::Quoted(quote_type, encode_inlines(&quote.content)),
            )
        }
        Entity::CodeFragment(code) => vec![Inline::Code(
            code_attr(attrs, code.programming_language.as_deref()),
            code.text.clone(),
        )],
        Entity::CodeExpression(expr) => {
            tracing::warn!(
                kind = "CodeExpression",
                "code expression was not rasterized, encoding it as inline code"
            );
            vec![Inline::Code(
                code_attr(attrs, expr.programming_language.as_deref()),
                expr.text.clone(),
            )]
        }
        Entity::MathFragment(math) => {
            warn_untranslated(math.math_language.as_deref(), "MathFragment");
            wrap_inline(attrs, Inline::Math(MathType::InlineMath, math.text.clone()))
        }
        Entity::Link(link) => vec![Inline::Link(
            encode_attrs_with(&attrs, STYLE_RENAMES),
            encode_inlines(&link.content),
            (link.target.clone(), link.title.clone().unwrap_or_default()),
        )],
        Entity::Cite(cite) => wrap_inline(
            attrs,
            Inline::Cite(
                vec![citation(cite)],
                cite.content.as_deref().map(encode_inlines).unwrap_or_default(),
            ),
        ),
        Entity::CiteGroup(group) => {
            let citations = group
                .items
                .iter()
                .filter_map(|item| match item {
                    Node::Entity(Entity::Cite(cite)) => Some(citation(cite)),
                    other => {
                        tracing::warn!(kind = other.kind(), "dropping citation group item");
                        None
                    }
                })
                .collect();
            wrap_inline(attrs, Inline::Cite(citations, Vec::new()))
        }
        Entity::ImageObject(image) => vec![Inline::Image(
            encode_attrs_with(&attrs, STYLE_RENAMES),
            image.caption.as_deref().map(encode_inlines).unwrap_or_default(),
            (
                image.content_url.clone(),
                image.title.clone().unwrap_or_default(),
            ),
        )],
        Entity::Note(note) => wrap_inline(attrs, Inline::Note(encode_blocks(&note.content))),
        Entity::Article(_)
        | Entity::Person(_)
        | Entity::Heading(_)
        | Entity::Paragraph(_)
        | Entity::QuoteBlock(_)
        | Entity::CodeBlock(_)
        | Entity::CodeChunk(_)
        | Entity::List(_)
        | Entity::ListItem(_)
        | Entity::Table(_)
        | Entity::TableRow(_)
        | Entity::TableCell(_)
        | Entity::Figure(_)
        | Entity::Collection(_)
        | Entity::ThematicBreak(_)
        | Entity::MathBlock(_) => vec![fallback_inline(entity.kind())],
    }
}

fn citation(cite: &Cite) -> Citation {
    Citation {
        citation_id: cite.target.clone(),
        citation_prefix: cite
            .citation_prefix
            .as_deref()
            .map(encode_inlines)
            .unwrap_or_default(),
        citation_suffix: cite
            .citation_suffix
            .as_deref()
            .map(encode_inlines)
            .unwrap_or_default(),
        citation_mode: match cite.citation_mode {
            CitationMode::Parenthetical => PandocMode::NormalCitation,
            CitationMode::Narrative => PandocMode::AuthorInText,
            CitationMode::NarrativeYear => PandocMode::SuppressAuthor,
        },
        citation_note_num: 0,
        citation_hash: 0,
    }
}

/// Splits text into `Str`, `Space` and `LineBreak` runs.
fn encode_text(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        let separator = match c {
            ' ' => Inline::Space,
            '\n' => Inline::LineBreak,
            _ => {
                word.push(c);
                continue;
            }
        };
        if !word.is_empty() {
            inlines.push(Inline::Str(std::mem::take(&mut word)));
        }
        inlines.push(separator);
    }
    if !word.is_empty() {
        inlines.push(Inline::Str(word));
    }
    inlines
}

fn code_attr(mut attrs: AttrMap, language: Option<&str>) -> crate::ast::Attr {
    if let Some(language) = language {
        let classes = match attrs.remove("classes") {
            Some(classes) => format!("{language} {classes}"),
            None => language.to_string(),
        };
        attrs.insert("classes".to_string(), classes);
    }
    encode_attrs_with(&attrs, STYLE_RENAMES)
}

fn style_attr(style: &str) -> crate::ast::Attr {
    styled(AttrMap::new(), style)
}

fn styled(mut attrs: AttrMap, style: &str) -> crate::ast::Attr {
    attrs.insert("style".to_string(), style.to_string());
    encode_attrs_with(&attrs, STYLE_RENAMES)
}

fn wrap_block(attrs: AttrMap, block: Block) -> Vec<Block> {
    if attrs.is_empty() {
        vec![block]
    } else {
        vec![Block::Div(encode_attrs_with(&attrs, STYLE_RENAMES), vec![block])]
    }
}

fn wrap_inline(attrs: AttrMap, inline: Inline) -> Vec<Inline> {
    if attrs.is_empty() {
        vec![inline]
    } else {
        vec![Inline::Span(encode_attrs_with(&attrs, STYLE_RENAMES), vec![inline])]
    }
}

/// The reserved style of an inline node standing in for executable code.
fn reserved_style(node: &Node) -> Option<&'static str> {
    node.as_entity().and_then(reserved_inline_style)
}

fn reserved_inline_style(entity: &Entity) -> Option<&'static str> {
    if is_block_entity(entity) {
        return None;
    }
    let style = entity.attrs().get("style").and_then(Node::as_str)?;
    [CODE_CHUNK, CODE_EXPRESSION]
        .into_iter()
        .find(|reserved| *reserved == style)
}

fn warn_untranslated(language: Option<&str>, kind: &str) {
    if let Some(language) = language {
        if !same_language(language, TARGET_LANGUAGE) {
            tracing::warn!(kind, language, "math was not translated to TeX");
        }
    }
}

fn fallback_block(kind: &str) -> Block {
    tracing::warn!(kind, "no block encoding, writing an empty paragraph");
    Block::Para(Vec::new())
}

fn fallback_inline(kind: &str) -> Inline {
    tracing::warn!(kind, "no inline encoding, writing empty text");
    Inline::Str(String::new())
}
