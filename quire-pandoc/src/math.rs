//! Math notation translation.
//!
//! Pandoc only understands TeX math. Math written in another notation is
//! translated before encoding through a [`MathTranslator`]. [`PandocMath`], the
//! default, hands MathML to pandoc's HTML reader and takes the TeX out of the
//! AST it returns.

use crate::ast::{self, Block, Inline};
use crate::bridge::{self, BridgeOptions};
use std::path::PathBuf;
use thiserror::Error;

/// The notation Pandoc expects.
pub const TARGET_LANGUAGE: &str = "tex";

#[derive(Debug, Error)]
#[error("cannot translate math from '{from}' to '{to}': {reason}")]
pub struct MathError {
    pub from: String,
    pub to: String,
    pub reason: String,
}

pub trait MathTranslator: Send + Sync {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, MathError>;
}

/// Translates only between identical notations.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMath;

impl MathTranslator for IdentityMath {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, MathError> {
        if same_language(from, to) {
            Ok(text.to_string())
        } else {
            Err(MathError {
                from: from.to_string(),
                to: to.to_string(),
                reason: "no translator configured".to_string(),
            })
        }
    }
}

const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Translates MathML to TeX by running pandoc.
///
/// `translate` blocks on the pandoc call, so it must run on a thread where
/// blocking is allowed, such as the `spawn_blocking` tasks of
/// [`resolve_nodes`](crate::codec::resolve_nodes).
#[derive(Debug, Default, Clone)]
pub struct PandocMath {
    /// Explicit pandoc binary, resolved like the bridge's when absent.
    pub binary: Option<PathBuf>,
}

impl PandocMath {
    pub fn new(binary: Option<PathBuf>) -> Self {
        PandocMath { binary }
    }

    fn error(from: &str, to: &str, reason: impl ToString) -> MathError {
        MathError {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl MathTranslator for PandocMath {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, MathError> {
        if same_language(from, to) {
            return Ok(text.to_string());
        }
        if normalize(from) != "mathml" || !same_language(to, TARGET_LANGUAGE) {
            return Err(Self::error(from, to, "only MathML to TeX is supported"));
        }

        let fragment = if text.trim_start().starts_with("<math") {
            text.to_string()
        } else {
            format!("<math xmlns=\"{MATHML_NAMESPACE}\">{text}</math>")
        };
        let options = BridgeOptions {
            binary: self.binary.clone(),
            ..Default::default()
        };
        let handle =
            tokio::runtime::Handle::try_current().map_err(|err| Self::error(from, to, err))?;
        let json = handle
            .block_on(bridge::to_json(fragment.as_bytes(), "html", &options))
            .map_err(|err| Self::error(from, to, err))?;
        let doc = ast::parse(&json).map_err(|err| Self::error(from, to, err))?;
        first_math(&doc.blocks).ok_or_else(|| Self::error(from, to, "pandoc returned no math"))
    }
}

fn first_math(blocks: &[Block]) -> Option<String> {
    blocks.iter().find_map(|block| match block {
        Block::Para(inlines) | Block::Plain(inlines) => first_inline_math(inlines),
        Block::Div(_, blocks) => first_math(blocks),
        _ => None,
    })
}

fn first_inline_math(inlines: &[Inline]) -> Option<String> {
    inlines.iter().find_map(|inline| match inline {
        Inline::Math(_, text) => Some(text.clone()),
        Inline::Span(_, inlines) => first_inline_math(inlines),
        _ => None,
    })
}

/// Whether two notation names denote the same language (`latex` is `tex`).
pub fn same_language(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(language: &str) -> String {
    match language.trim().to_ascii_lowercase().as_str() {
        "latex" | "tex" => "tex".to_string(),
        other => other.to_string(),
    }
}
