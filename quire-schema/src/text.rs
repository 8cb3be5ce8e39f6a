//! Plain-text flattening of nodes.
//!
//! Used wherever a rich node must collapse into a short string: image alt
//! text, bibliographic titles, diagnostics.

use crate::nodes::{Entity, Node};

/// Concatenates the textual content of a node.
///
/// Block-level children are separated by a blank line; inline children are
/// joined without separators.
pub fn to_text(node: &Node) -> String {
    match node {
        Node::Null => String::new(),
        Node::Boolean(value) => value.to_string(),
        Node::Number(value) => format_number(*value),
        Node::String(text) => text.clone(),
        Node::Array(items) => inlines_to_text(items),
        Node::Object(_) => String::new(),
        Node::Entity(entity) => entity_to_text(entity),
    }
}

/// Concatenates a run of inline nodes.
pub fn inlines_to_text(nodes: &[Node]) -> String {
    nodes.iter().map(to_text).collect()
}

fn blocks_to_text(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(to_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn entity_to_text(entity: &Entity) -> String {
    match entity {
        Entity::Article(article) => {
            let mut parts = Vec::new();
            if let Some(title) = &article.title {
                parts.push(inlines_to_text(title));
            }
            if let Some(content) = &article.content {
                parts.push(blocks_to_text(content));
            }
            parts.join("\n\n")
        }
        Entity::Person(person) => person.full_name(),
        Entity::Heading(n) => inlines_to_text(&n.content),
        Entity::Paragraph(n) => inlines_to_text(&n.content),
        Entity::QuoteBlock(n) => blocks_to_text(&n.content),
        Entity::CodeBlock(n) => n.text.clone(),
        Entity::CodeChunk(n) => n.text.clone(),
        Entity::List(n) => blocks_to_text(&n.items),
        Entity::ListItem(n) => blocks_to_text(&n.content),
        Entity::Table(n) => n
            .rows
            .iter()
            .map(to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Entity::TableRow(n) => n
            .cells
            .iter()
            .map(to_text)
            .collect::<Vec<_>>()
            .join("\t"),
        Entity::TableCell(n) => inlines_to_text(&n.content),
        Entity::Figure(n) => blocks_to_text(&n.content),
        Entity::Collection(n) => blocks_to_text(&n.parts),
        Entity::ThematicBreak(_) => String::new(),
        Entity::MathBlock(n) | Entity::MathFragment(n) => n.text.clone(),
        Entity::Emphasis(n)
        | Entity::Strong(n)
        | Entity::Delete(n)
        | Entity::Subscript(n)
        | Entity::Superscript(n) => inlines_to_text(&n.content),
        Entity::Quote(n) => inlines_to_text(&n.content),
        Entity::CodeFragment(n) => n.text.clone(),
        Entity::CodeExpression(n) => match &n.output {
            Some(output) => to_text(output),
            None => n.text.clone(),
        },
        Entity::Link(n) => inlines_to_text(&n.content),
        Entity::Cite(n) => match &n.content {
            Some(content) => inlines_to_text(content),
            None => format!("@{}", n.target),
        },
        Entity::CiteGroup(n) => n
            .items
            .iter()
            .map(to_text)
            .collect::<Vec<_>>()
            .join("; "),
        Entity::ImageObject(n) => n.caption.as_deref().map(inlines_to_text).unwrap_or_default(),
        Entity::Note(n) => blocks_to_text(&n.content),
    }
}

/// Formats integral values without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Mark, Paragraph};

    #[test]
    fn flattens_inline_marks() {
        let node = Node::Entity(Entity::Paragraph(Paragraph::new(vec![
            Node::text("Hello "),
            Node::Entity(Entity::Strong(Mark::new(vec![Node::text("world")]))),
        ])));
        assert_eq!(to_text(&node), "Hello world");
    }

    #[test]
    fn numbers_drop_trailing_zero() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(1.25), "1.25");
    }
}
