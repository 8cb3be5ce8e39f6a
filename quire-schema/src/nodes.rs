//! Core data structures of the document node graph.
//!
//! A [`Node`] is either a primitive value (the shapes execution outputs take) or
//! an [`Entity`]: a `type`-discriminated record. Entities serialise as JSON-LD
//! style objects, e.g. `{"type": "Paragraph", "content": ["Hello"]}`.
//!
//! Every entity carries an open attribute bag ([`Attributes`]) flattened into
//! its JSON object. Codecs use it to thread identifiers, classes and styles
//! through formats that have no dedicated field for them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open attribute bag carried by every entity.
pub type Attributes = BTreeMap<String, Node>;

/// A node of the document graph.
///
/// Variant order matters for deserialisation: objects are tried as entities
/// first and fall back to plain objects when their `type` is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Node>),
    Entity(Entity),
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// Shorthand for a plain text run.
    pub fn text(value: impl Into<String>) -> Self {
        Node::String(value.into())
    }

    /// Name of the node kind, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "Null",
            Node::Boolean(_) => "Boolean",
            Node::Number(_) => "Number",
            Node::String(_) => "String",
            Node::Array(_) => "Array",
            Node::Entity(entity) => entity.kind(),
            Node::Object(_) => "Object",
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Node::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(text) => Some(text),
            _ => None,
        }
    }

    /// The `type` declared by an object this version does not model.
    pub fn unknown_type(&self) -> Option<&str> {
        match self {
            Node::Object(map) => map.get("type").and_then(Node::as_str),
            _ => None,
        }
    }
}

impl From<Entity> for Node {
    fn from(entity: Entity) -> Self {
        Node::Entity(entity)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::String(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::String(text)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Number(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Boolean(value)
    }
}

/// Typed entities, discriminated by their `type` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entity {
    Article(Article),
    Person(Person),

    Heading(Heading),
    Paragraph(Paragraph),
    QuoteBlock(QuoteBlock),
    CodeBlock(CodeBlock),
    CodeChunk(CodeChunk),
    List(List),
    ListItem(ListItem),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    Figure(Figure),
    Collection(Collection),
    ThematicBreak(ThematicBreak),
    MathBlock(Math),

    Emphasis(Mark),
    Strong(Mark),
    Delete(Mark),
    Subscript(Mark),
    Superscript(Mark),
    Quote(Quote),
    CodeFragment(CodeFragment),
    CodeExpression(CodeExpression),
    MathFragment(Math),
    Link(Link),
    Cite(Cite),
    CiteGroup(CiteGroup),
    ImageObject(ImageObject),
    Note(Note),
}

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Article(_) => "Article",
            Entity::Person(_) => "Person",
            Entity::Heading(_) => "Heading",
            Entity::Paragraph(_) => "Paragraph",
            Entity::QuoteBlock(_) => "QuoteBlock",
            Entity::CodeBlock(_) => "CodeBlock",
            Entity::CodeChunk(_) => "CodeChunk",
            Entity::List(_) => "List",
            Entity::ListItem(_) => "ListItem",
            Entity::Table(_) => "Table",
            Entity::TableRow(_) => "TableRow",
            Entity::TableCell(_) => "TableCell",
            Entity::Figure(_) => "Figure",
            Entity::Collection(_) => "Collection",
            Entity::ThematicBreak(_) => "ThematicBreak",
            Entity::MathBlock(_) => "MathBlock",
            Entity::Emphasis(_) => "Emphasis",
            Entity::Strong(_) => "Strong",
            Entity::Delete(_) => "Delete",
            Entity::Subscript(_) => "Subscript",
            Entity::Superscript(_) => "Superscript",
            Entity::Quote(_) => "Quote",
            Entity::CodeFragment(_) => "CodeFragment",
            Entity::CodeExpression(_) => "CodeExpression",
            Entity::MathFragment(_) => "MathFragment",
            Entity::Link(_) => "Link",
            Entity::Cite(_) => "Cite",
            Entity::CiteGroup(_) => "CiteGroup",
            Entity::ImageObject(_) => "ImageObject",
            Entity::Note(_) => "Note",
        }
    }

    pub fn attrs(&self) -> &Attributes {
        match self {
            Entity::Article(n) => &n.attrs,
            Entity::Person(n) => &n.attrs,
            Entity::Heading(n) => &n.attrs,
            Entity::Paragraph(n) => &n.attrs,
            Entity::QuoteBlock(n) => &n.attrs,
            Entity::CodeBlock(n) => &n.attrs,
            Entity::CodeChunk(n) => &n.attrs,
            Entity::List(n) => &n.attrs,
            Entity::ListItem(n) => &n.attrs,
            Entity::Table(n) => &n.attrs,
            Entity::TableRow(n) => &n.attrs,
            Entity::TableCell(n) => &n.attrs,
            Entity::Figure(n) => &n.attrs,
            Entity::Collection(n) => &n.attrs,
            Entity::ThematicBreak(n) => &n.attrs,
            Entity::MathBlock(n) | Entity::MathFragment(n) => &n.attrs,
            Entity::Emphasis(n)
            | Entity::Strong(n)
            | Entity::Delete(n)
            | Entity::Subscript(n)
            | Entity::Superscript(n) => &n.attrs,
            Entity::Quote(n) => &n.attrs,
            Entity::CodeFragment(n) => &n.attrs,
            Entity::CodeExpression(n) => &n.attrs,
            Entity::Link(n) => &n.attrs,
            Entity::Cite(n) => &n.attrs,
            Entity::CiteGroup(n) => &n.attrs,
            Entity::ImageObject(n) => &n.attrs,
            Entity::Note(n) => &n.attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        match self {
            Entity::Article(n) => &mut n.attrs,
            Entity::Person(n) => &mut n.attrs,
            Entity::Heading(n) => &mut n.attrs,
            Entity::Paragraph(n) => &mut n.attrs,
            Entity::QuoteBlock(n) => &mut n.attrs,
            Entity::CodeBlock(n) => &mut n.attrs,
            Entity::CodeChunk(n) => &mut n.attrs,
            Entity::List(n) => &mut n.attrs,
            Entity::ListItem(n) => &mut n.attrs,
            Entity::Table(n) => &mut n.attrs,
            Entity::TableRow(n) => &mut n.attrs,
            Entity::TableCell(n) => &mut n.attrs,
            Entity::Figure(n) => &mut n.attrs,
            Entity::Collection(n) => &mut n.attrs,
            Entity::ThematicBreak(n) => &mut n.attrs,
            Entity::MathBlock(n) | Entity::MathFragment(n) => &mut n.attrs,
            Entity::Emphasis(n)
            | Entity::Strong(n)
            | Entity::Delete(n)
            | Entity::Subscript(n)
            | Entity::Superscript(n) => &mut n.attrs,
            Entity::Quote(n) => &mut n.attrs,
            Entity::CodeFragment(n) => &mut n.attrs,
            Entity::CodeExpression(n) => &mut n.attrs,
            Entity::Link(n) => &mut n.attrs,
            Entity::Cite(n) => &mut n.attrs,
            Entity::CiteGroup(n) => &mut n.attrs,
            Entity::ImageObject(n) => &mut n.attrs,
            Entity::Note(n) => &mut n.attrs,
        }
    }
}

/// The root of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub family_names: Vec<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl Person {
    pub fn new(given: &str, family: &str) -> Self {
        Person {
            given_names: vec![given.to_string()],
            family_names: vec![family.to_string()],
            attrs: Attributes::new(),
        }
    }

    /// Display name: given names followed by family names.
    pub fn full_name(&self) -> String {
        self.given_names
            .iter()
            .chain(self.family_names.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Splits a display name, treating the last word as the family name.
    pub fn from_name(name: &str) -> Self {
        let mut words: Vec<String> = name.split_whitespace().map(str::to_string).collect();
        let family = if words.len() > 1 { words.pop() } else { None };
        Person {
            given_names: words,
            family_names: family.into_iter().collect(),
            attrs: Attributes::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub depth: u8,
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl Paragraph {
    pub fn new(content: Vec<Node>) -> Self {
        Paragraph {
            content,
            attrs: Attributes::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBlock {
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

/// Executable code block, optionally carrying the outputs of its last run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunk {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListOrder {
    Ascending,
    Descending,
    #[default]
    Unordered,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// `ListItem` entities.
    pub items: Vec<Node>,
    #[serde(default)]
    pub order: ListOrder,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_checked: Option<bool>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// `TableRow` entities.
    pub rows: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRowType {
    Header,
    Footer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// `TableCell` entities.
    pub cells: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_type: Option<TableRowType>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Inline content.
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub parts: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThematicBreak {
    #[serde(flatten)]
    pub attrs: Attributes,
}

/// Shared shape of `MathBlock` and `MathFragment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Math {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_language: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

/// Shared shape of the simple inline marks (`Emphasis`, `Strong`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl Mark {
    pub fn new(content: Vec<Node>) -> Self {
        Mark {
            content,
            attrs: Attributes::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cite: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFragment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

/// Executable inline code, optionally carrying its evaluated value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExpression {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Box<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub content: Vec<Node>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationMode {
    #[default]
    Parenthetical,
    Narrative,
    /// Parenthetical citation that omits the author, e.g. "(2019)".
    NarrativeYear,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cite {
    pub target: String,
    #[serde(default)]
    pub citation_mode: CitationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_prefix: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_suffix: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl Cite {
    pub fn new(target: impl Into<String>) -> Self {
        Cite {
            target: target.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CiteGroup {
    /// `Cite` entities.
    pub items: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    pub content_url: String,
    /// Alternate text, as inline content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl ImageObject {
    pub fn new(content_url: impl Into<String>) -> Self {
        ImageObject {
            content_url: content_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Block content.
    pub content: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}
