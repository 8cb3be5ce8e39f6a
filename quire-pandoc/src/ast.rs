//! Pandoc JSON AST.
//!
//! Mirrors the document model of `pandoc-types` 1.17 (the JSON Pandoc emits
//! with `--to=json` and consumes with `--from=json`). Every element is an
//! object with a `t` tag and, unless it is a unit element, a `c` payload:
//!
//! ```text
//! {"t": "Para", "c": [{"t": "Str", "c": "Hello"}, {"t": "Space"}]}
//! ```
//!
//! Elements whose tag this version does not know are parsed as the explicit
//! `Unknown` variants (see [`parse`]) so one exotic element cannot fail the
//! whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// API version written into every encoded document.
pub const API_VERSION: [u32; 4] = [1, 17, 5, 4];

/// Attribute triple: identifier, classes and key/value pairs.
pub type Attr = (String, Vec<String>, Vec<(String, String)>);

/// Link or image target: URL and title.
pub type Target = (String, String);

/// Table cells are lists of blocks.
pub type TableCell = Vec<Block>;

pub type Meta = BTreeMap<String, MetaValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pandoc {
    #[serde(rename = "pandoc-api-version")]
    pub api_version: Vec<u32>,
    pub meta: Meta,
    pub blocks: Vec<Block>,
}

impl Pandoc {
    pub fn new(meta: Meta, blocks: Vec<Block>) -> Self {
        Pandoc {
            api_version: API_VERSION.to_vec(),
            meta,
            blocks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum MetaValue {
    MetaMap(BTreeMap<String, MetaValue>),
    MetaList(Vec<MetaValue>),
    MetaBool(bool),
    MetaString(String),
    MetaInlines(Vec<Inline>),
    MetaBlocks(Vec<Block>),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Block {
    Plain(Vec<Inline>),
    Para(Vec<Inline>),
    CodeBlock(Attr, String),
    RawBlock(String, String),
    BlockQuote(Vec<Block>),
    OrderedList(ListAttributes, Vec<Vec<Block>>),
    BulletList(Vec<Vec<Block>>),
    Header(u8, Attr, Vec<Inline>),
    HorizontalRule,
    /// Caption, column alignments, relative widths, header cells, rows.
    Table(
        Vec<Inline>,
        Vec<Alignment>,
        Vec<f64>,
        Vec<TableCell>,
        Vec<Vec<TableCell>>,
    ),
    Div(Attr, Vec<Block>),
    Null,
    /// An element with a tag unknown to this version; holds the tag.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Inline {
    Str(String),
    Emph(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikeout(Vec<Inline>),
    Superscript(Vec<Inline>),
    Subscript(Vec<Inline>),
    SmallCaps(Vec<Inline>),
    Quoted(QuoteType, Vec<Inline>),
    Cite(Vec<Citation>, Vec<Inline>),
    Code(Attr, String),
    Space,
    SoftBreak,
    LineBreak,
    Math(MathType, String),
    RawInline(String, String),
    Link(Attr, Vec<Inline>, Target),
    Image(Attr, Vec<Inline>, Target),
    Note(Vec<Block>),
    Span(Attr, Vec<Inline>),
    /// An element with a tag unknown to this version; holds the tag.
    Unknown(String),
}

pub type ListAttributes = (i32, ListNumberStyle, ListNumberDelim);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ListNumberStyle {
    DefaultStyle,
    Example,
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ListNumberDelim {
    DefaultDelim,
    Period,
    OneParen,
    TwoParens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Alignment {
    AlignLeft,
    AlignRight,
    AlignCenter,
    AlignDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum QuoteType {
    SingleQuote,
    DoubleQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum MathType {
    DisplayMath,
    InlineMath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum CitationMode {
    AuthorInText,
    SuppressAuthor,
    NormalCitation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub citation_id: String,
    pub citation_prefix: Vec<Inline>,
    pub citation_suffix: Vec<Inline>,
    pub citation_mode: CitationMode,
    pub citation_note_num: i32,
    pub citation_hash: i32,
}

/// Every tag the typed model understands, including enumeration tags.
const KNOWN_TAGS: &[&str] = &[
    // meta
    "MetaMap",
    "MetaList",
    "MetaBool",
    "MetaString",
    "MetaInlines",
    "MetaBlocks",
    // blocks
    "Plain",
    "Para",
    "CodeBlock",
    "RawBlock",
    "BlockQuote",
    "OrderedList",
    "BulletList",
    "Header",
    "HorizontalRule",
    "Table",
    "Div",
    "Null",
    // inlines
    "Str",
    "Emph",
    "Strong",
    "Strikeout",
    "Superscript",
    "Subscript",
    "SmallCaps",
    "Quoted",
    "Cite",
    "Code",
    "Space",
    "SoftBreak",
    "LineBreak",
    "Math",
    "RawInline",
    "Link",
    "Image",
    "Note",
    "Span",
    // enumerations
    "DefaultStyle",
    "Example",
    "Decimal",
    "LowerRoman",
    "UpperRoman",
    "LowerAlpha",
    "UpperAlpha",
    "DefaultDelim",
    "Period",
    "OneParen",
    "TwoParens",
    "AlignLeft",
    "AlignRight",
    "AlignCenter",
    "AlignDefault",
    "SingleQuote",
    "DoubleQuote",
    "DisplayMath",
    "InlineMath",
    "AuthorInText",
    "SuppressAuthor",
    "NormalCitation",
];

/// Parses Pandoc JSON, mapping unknown element tags onto `Unknown` variants.
pub fn parse(json: &str) -> Result<Pandoc, serde_json::Error> {
    let mut value: Value = serde_json::from_str(json)?;
    mark_unknown(&mut value);
    serde_json::from_value(value)
}

/// Serialises a document to Pandoc JSON.
pub fn to_json(doc: &Pandoc) -> Result<String, serde_json::Error> {
    serde_json::to_string(doc)
}

fn mark_unknown(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let unknown = map
                .get("t")
                .and_then(Value::as_str)
                .filter(|tag| !KNOWN_TAGS.contains(tag))
                .map(str::to_string);
            if let Some(tag) = unknown {
                map.clear();
                map.insert("t".to_string(), Value::String("Unknown".to_string()));
                map.insert("c".to_string(), Value::String(tag));
                return;
            }
            for child in map.values_mut() {
                mark_unknown(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                mark_unknown(item);
            }
        }
        _ => {}
    }
}
