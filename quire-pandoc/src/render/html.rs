//! HTML shown in rasterized images.
//!
//! Only the kinds that get rasterized need a faithful rendering: executable
//! code with its outputs, and expressions with their values. Everything else
//! falls back to escaped plain text.

use super::Screenshot;
use quire_schema::text::format_number;
use quire_schema::{to_text, Entity, Node};

/// CSS selector of the element wrapping the rendered node.
pub const SELECTOR: &str = ".quire-node";

const STYLE: &str = concat!(
    "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif; }\n",
    "pre, code { font-family: 'SF Mono', Menlo, Monaco, 'Courier New', monospace; }\n",
    ".quire-node { padding: 8px; }\n",
    ".quire-outputs { margin-top: 8px; border-top: 1px solid #ddd; padding-top: 8px; }\n",
);

/// A complete page rendering `node`, ready for the rasterizer.
pub fn screenshot_request(node: &Node) -> Screenshot {
    Screenshot {
        html: page(&node_to_html(node)),
        selector: SELECTOR.to_string(),
        viewport: None,
    }
}

/// Wraps body markup in a standalone page.
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{STYLE}</style>\n</head>\n<body>\n<div class=\"quire-node\">{body}</div>\n</body>\n</html>\n"
    )
}

/// Renders a node as an HTML fragment.
pub fn node_to_html(node: &Node) -> String {
    match node {
        Node::Null => String::new(),
        Node::Boolean(value) => value.to_string(),
        Node::Number(value) => format_number(*value),
        Node::String(text) => escape(text),
        Node::Array(items) => items.iter().map(node_to_html).collect(),
        Node::Object(_) => format!("<pre>{}</pre>", escape(&json(node))),
        Node::Entity(entity) => entity_to_html(entity),
    }
}

fn entity_to_html(entity: &Entity) -> String {
    match entity {
        Entity::CodeChunk(chunk) => {
            let mut html = code_block(&chunk.text, chunk.programming_language.as_deref());
            if let Some(outputs) = &chunk.outputs {
                html.push_str("<div class=\"quire-outputs\">");
                for output in outputs {
                    html.push_str(&output_to_html(output));
                }
                html.push_str("</div>");
            }
            html
        }
        Entity::CodeExpression(expr) => match &expr.output {
            Some(output) => format!("<span>{}</span>", output_to_html(output)),
            None => format!("<code>{}</code>", escape(&expr.text)),
        },
        Entity::CodeBlock(block) => code_block(&block.text, block.programming_language.as_deref()),
        Entity::MathBlock(math) | Entity::MathFragment(math) => {
            format!("<code class=\"math\">{}</code>", escape(&math.text))
        }
        Entity::ImageObject(image) => {
            format!("<img src=\"{}\">", escape(&image.content_url))
        }
        other => format!("<p>{}</p>", escape(&to_text(&Node::Entity(other.clone())))),
    }
}

fn output_to_html(output: &Node) -> String {
    match output {
        Node::Array(_) | Node::Object(_) => format!("<pre>{}</pre>", escape(&json(output))),
        Node::String(text) => format!("<pre>{}</pre>", escape(text)),
        other => node_to_html(other),
    }
}

fn code_block(text: &str, language: Option<&str>) -> String {
    match language {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape(lang),
            escape(text)
        ),
        None => format!("<pre><code>{}</code></pre>", escape(text)),
    }
}

fn json(node: &Node) -> String {
    serde_json::to_string_pretty(node).unwrap_or_default()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
