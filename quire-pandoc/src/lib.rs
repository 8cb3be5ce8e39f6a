//! Pandoc interop for quire documents
//!
//!     Converts quire node graphs to and from any format pandoc reads or writes, going
//!     through pandoc's JSON AST. pandoc itself is only ever reached across a process
//!     boundary (see ./bridge.rs).
//!
//!     Pandoc's model is poorer than ours. Structure it lacks (figures, captions, code
//!     chunks) travels in `custom-style` attributes; nodes it cannot show at all are
//!     rendered to an image that carries the node itself in a private PNG chunk, the
//!     "rPNG" side channel (see ./rpng/mod.rs). A document written this way can be
//!     edited in a word processor and read back without losing the executable parts.
//!
//!     The file structure :
//!     .
//!     ├── ast.rs          # pandoc JSON AST
//!     ├── attrs.rs        # pandoc attributes <-> node attributes
//!     ├── bridge.rs       # running the pandoc binary
//!     ├── codec
//!     │   ├── decode.rs   # pandoc AST -> nodes
//!     │   ├── encode.rs   # nodes -> pandoc AST
//!     │   ├── meta.rs     # document metadata
//!     │   └── prepass.rs  # async stages: image sniffing, math, rasterizing
//!     ├── render          # Rasterizer trait, headless Chrome, HTML for screenshots
//!     ├── rpng            # PNG text chunks and the side channel
//!     ├── math.rs         # MathTranslator seam
//!     ├── store.rs        # NodeStore seam for the link strategy
//!     └── registry.rs     # known pandoc formats
//!
//! Pipelines
//!
//!     decode: bytes -> pandoc --to=json -> ast::parse -> resolve_images -> decode_document
//!     encode: node -> resolve_nodes -> encode_node -> ast::to_json -> pandoc --from=json
//!
//!     The `json` format skips pandoc entirely, which is also how the tests drive the
//!     pipelines without a pandoc install.
//!
//! Errors
//!
//!     Content problems never fail a conversion: kinds without a mapping are logged
//!     with `tracing::warn!` and dropped. Failures are reserved for the engine (missing
//!     binary, errors on stderr), malformed AST JSON and rasterizer errors.

pub mod ast;
pub mod attrs;
pub mod bridge;
pub mod codec;
pub mod error;
pub mod math;
pub mod registry;
pub mod render;
pub mod rpng;
pub mod store;

pub use bridge::BridgeOptions;
pub use codec::{
    decode_document, encode_node, resolve_images, resolve_nodes, DecodeContext, EncodeContext,
};
pub use error::{BridgeError, CodecError, Result, RpngError};
pub use registry::{FormatRegistry, PandocFormat};

use quire_schema::Node;
use std::path::PathBuf;

const JSON: &str = "json";

#[derive(Debug, Clone)]
pub struct DecodeSettings {
    /// Pandoc reader name.
    pub format: String,
    pub bridge: BridgeOptions,
    /// Where pandoc extracts images from binary inputs. When absent they go to
    /// a scratch directory and are inlined as data URIs before it is removed.
    pub media_dir: Option<PathBuf>,
    pub context: DecodeContext,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        DecodeSettings {
            format: "markdown".to_string(),
            bridge: BridgeOptions::default(),
            media_dir: None,
            context: DecodeContext::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodeSettings {
    /// Pandoc writer name.
    pub format: String,
    pub bridge: BridgeOptions,
    /// Have pandoc write a file even for text formats.
    pub ensure_file: bool,
    pub context: EncodeContext,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        EncodeSettings {
            format: "markdown".to_string(),
            bridge: BridgeOptions {
                standalone: true,
                ..Default::default()
            },
            ensure_file: false,
            context: EncodeContext::default(),
        }
    }
}

/// Decodes a document in `settings.format` into an `Article`.
pub async fn decode(input: &[u8], settings: &DecodeSettings) -> Result<Node> {
    let registry = FormatRegistry::default();
    let mut scratch = None;
    let mut scratch_media = None;

    let json = if settings.format == JSON {
        String::from_utf8(input.to_vec()).map_err(|err| CodecError::Malformed(err.to_string()))?
    } else if registry.is_binary(&settings.format) {
        let dir = tempfile::tempdir()?;
        let path = dir
            .path()
            .join(format!("input.{}", registry.file_extension(&settings.format)));
        tokio::fs::write(&path, input).await?;
        let media = match &settings.media_dir {
            Some(media) => media.clone(),
            None => {
                let media = dir.path().join("media");
                scratch_media = Some(media.clone());
                media
            }
        };

        let mut options = settings.bridge.clone();
        options.input = Some(path);
        options
            .extra_args
            .push(format!("--extract-media={}", media.display()));
        scratch = Some(dir);
        bridge::to_json(&[], &settings.format, &options).await?
    } else {
        bridge::to_json(input, &settings.format, &settings.bridge).await?
    };

    let doc = ast::parse(&json).map_err(|err| CodecError::Malformed(err.to_string()))?;
    let resolved = resolve_images(&doc, &settings.context).await?;
    let mut node = decode_document(&doc, &resolved);
    // images left in the scratch directory would dangle once it is removed
    if let Some(media) = &scratch_media {
        codec::inline_media(&mut node, media).await;
    }
    drop(scratch);
    Ok(node)
}

/// Encodes a node into `settings.format`.
pub async fn encode(node: &Node, settings: &EncodeSettings) -> Result<Vec<u8>> {
    let resolved = resolve_nodes(node, &settings.context).await?;
    let doc = encode_node(&resolved);
    let json = ast::to_json(&doc).map_err(|err| CodecError::Malformed(err.to_string()))?;
    if settings.format == JSON {
        return Ok(json.into_bytes());
    }

    let mut options = writer_options(&resolved, &settings.bridge);
    let registry = FormatRegistry::default();
    if !(settings.ensure_file || registry.is_binary(&settings.format)) {
        return Ok(bridge::from_json(&json, &settings.format, &options).await?);
    }

    let dir = tempfile::tempdir()?;
    let path = dir
        .path()
        .join(format!("output.{}", registry.file_extension(&settings.format)));
    options.output = Some(path.clone());
    bridge::from_json(&json, &settings.format, &options).await?;
    Ok(tokio::fs::read(&path).await?)
}

/// Articles with references need the citation processor to render them.
fn writer_options(node: &Node, bridge: &BridgeOptions) -> BridgeOptions {
    let mut options = bridge.clone();
    if let Node::Entity(quire_schema::Entity::Article(article)) = node {
        if article.references.as_ref().is_some_and(|refs| !refs.is_empty()) {
            options.citeproc = true;
        }
    }
    options
}
