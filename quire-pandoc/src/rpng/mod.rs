//! rPNG: nodes carried inside PNG images.
//!
//! Pandoc has no representation for executable code or its outputs, but every
//! target format can hold an image. An rPNG is a screenshot of the node with
//! the node itself hidden in a private text chunk, so a document that went out
//! through Pandoc comes back with the node intact.
//!
//! # Chunk format
//!
//! The payload is the node's JSON-LD (`@context` added on write, removed on
//! read) under the keyword [`KEYWORD`]:
//!
//! | Chunk  | Text                        |
//! |--------|-----------------------------|
//! | `tEXt` | `base64(payload)`           |
//! | `zTXt` | `base64(deflate(payload))`  |
//!
//! `zTXt` additionally zlib-compresses its text as the PNG format requires, so
//! the result stays a valid PNG. Decoding picks the inverse from the chunk tag.
//!
//! # Strategies
//!
//! | Strategy  | Where the node goes                                          |
//! |-----------|--------------------------------------------------------------|
//! | `chunk`   | text chunk in the image (default)                            |
//! | `alt-text`| the image's alternate text, marked by the title `rpng`       |
//! | `link`    | a [`NodeStore`]; the image is wrapped in a link to its URL   |

mod png;

pub use png::{Chunk, ChunkKind, Png, TextChunks, SIGNATURE};

use crate::error::RpngError;
use crate::store::NodeStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use quire_schema::{Entity, ImageObject, Link, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Keyword of the text chunk holding the payload.
pub const KEYWORD: &str = "json-ld";

/// Image title marking alt text that holds a payload.
pub const ALT_TEXT_TITLE: &str = "rpng";

/// `@context` written into payloads.
pub const CONTEXT: &str = "http://schema.org";

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RpngStrategy {
    #[default]
    Chunk,
    AltText,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpngSettings {
    pub strategy: RpngStrategy,
    pub chunk_kind: ChunkKind,
    /// Drop code chunk outputs from payloads; the image still shows them.
    pub elide_outputs: bool,
}

impl Default for RpngSettings {
    fn default() -> Self {
        RpngSettings {
            strategy: RpngStrategy::Chunk,
            chunk_kind: ChunkKind::Text,
            elide_outputs: true,
        }
    }
}

/// Whether `image` is a PNG holding a text chunk with `keyword`. Never fails.
pub fn has(keyword: &str, image: &[u8]) -> bool {
    Png::parse(image)
        .map(|png| has_in(keyword, &png))
        .unwrap_or(false)
}

pub fn has_in(keyword: &str, container: &impl TextChunks) -> bool {
    container.text(keyword).is_some()
}

/// The payload stored under `keyword`.
pub fn extract(keyword: &str, image: &[u8]) -> Result<String, RpngError> {
    extract_from(keyword, &Png::parse(image)?)
}

pub fn extract_from(keyword: &str, container: &impl TextChunks) -> Result<String, RpngError> {
    let (kind, text) = container
        .text(keyword)
        .ok_or_else(|| RpngError::NotFound(keyword.to_string()))??;
    let decoded = STANDARD.decode(text.trim())?;
    let bytes = match kind {
        ChunkKind::Text => decoded,
        ChunkKind::Compressed => {
            let mut inflated = Vec::new();
            DeflateDecoder::new(decoded.as_slice()).read_to_end(&mut inflated)?;
            inflated
        }
    };
    String::from_utf8(bytes).map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err).into())
}

/// Stores `text` under `keyword`, replacing any earlier payload with that keyword.
pub fn insert(
    keyword: &str,
    text: &str,
    image: &[u8],
    kind: ChunkKind,
) -> Result<Vec<u8>, RpngError> {
    let mut png = Png::parse(image)?;
    insert_into(keyword, text, &mut png, kind)?;
    Ok(png.to_bytes())
}

pub fn insert_into(
    keyword: &str,
    text: &str,
    container: &mut impl TextChunks,
    kind: ChunkKind,
) -> Result<(), RpngError> {
    let encoded = match kind {
        ChunkKind::Text => STANDARD.encode(text),
        ChunkKind::Compressed => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes())?;
            STANDARD.encode(encoder.finish()?)
        }
    };
    container.remove_text(keyword);
    container.push_text(keyword, &encoded, kind)
}

/// Serialises a node as a JSON-LD payload.
pub fn to_payload(node: &Node, elide_outputs: bool) -> Result<String, RpngError> {
    let mut value = match node {
        Node::Entity(Entity::CodeChunk(chunk)) if elide_outputs && chunk.outputs.is_some() => {
            let mut chunk = chunk.clone();
            chunk.outputs = None;
            serde_json::to_value(Node::Entity(Entity::CodeChunk(chunk)))?
        }
        _ => serde_json::to_value(node)?,
    };
    if let Value::Object(map) = &mut value {
        map.insert("@context".to_string(), Value::String(CONTEXT.to_string()));
    }
    Ok(serde_json::to_string(&value)?)
}

/// Parses a payload written by [`to_payload`].
pub fn from_payload(json: &str) -> Result<Node, RpngError> {
    let mut value: Value = serde_json::from_str(json)?;
    if let Value::Object(map) = &mut value {
        map.remove("@context");
    }
    Ok(serde_json::from_value(value)?)
}

/// Attaches `node` to a screenshot of it, returning the node to show in its place.
///
/// The result is an `ImageObject`, or for the `link` strategy a `Link` wrapping
/// one.
pub fn embed(
    node: &Node,
    image: &[u8],
    settings: &RpngSettings,
    store: Option<&dyn NodeStore>,
) -> Result<Node, RpngError> {
    let payload = to_payload(node, settings.elide_outputs)?;
    match settings.strategy {
        RpngStrategy::Chunk => {
            let bytes = insert(KEYWORD, &payload, image, settings.chunk_kind)?;
            Ok(image_node(ImageObject::new(to_data_uri(&bytes))))
        }
        RpngStrategy::AltText => {
            let mut object = ImageObject::new(to_data_uri(image));
            object.caption = Some(vec![Node::String(payload)]);
            object.title = Some(ALT_TEXT_TITLE.to_string());
            Ok(image_node(object))
        }
        RpngStrategy::Link => {
            let store = store.ok_or_else(|| {
                RpngError::Store("the link strategy needs a node store".to_string())
            })?;
            let url = store.put(node)?;
            Ok(Node::Entity(Entity::Link(Link {
                content: vec![image_node(ImageObject::new(to_data_uri(image)))],
                target: url,
                ..Default::default()
            })))
        }
    }
}

/// The node in an image's alt text, when the title marks it as a payload.
pub fn decode_alt_text(title: &str, alt_text: &str) -> Option<Node> {
    if title != ALT_TEXT_TITLE {
        return None;
    }
    match from_payload(alt_text) {
        Ok(node) => Some(node),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed rpng alt text");
            None
        }
    }
}

/// The node embedded in an image's bytes, or `None` for ordinary images.
pub fn sniff_bytes(image: &[u8]) -> Result<Option<Node>, RpngError> {
    let Ok(png) = Png::parse(image) else {
        return Ok(None);
    };
    if !has_in(KEYWORD, &png) {
        return Ok(None);
    }
    let payload = extract_from(KEYWORD, &png)?;
    from_payload(&payload).map(Some)
}

/// Loads the image at `target` and returns the node embedded in it.
///
/// `target` may be a `data:` URI, a `file://` URL or a path, relative paths
/// being resolved against `base_dir`. Images that cannot be found locally,
/// remote URLs and images without a payload all yield `None`.
pub async fn sniff_decode(
    target: &str,
    base_dir: Option<&Path>,
) -> Result<Option<Node>, RpngError> {
    if let Some(encoded) = target.strip_prefix(DATA_URI_PREFIX) {
        let bytes = STANDARD.decode(encoded.trim())?;
        return sniff_bytes(&bytes);
    }

    let Some(path) = local_path(target, base_dir) else {
        tracing::debug!(target, "not sniffing non-local image");
        return Ok(None);
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => sniff_bytes(&bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "image not found, treating as ordinary");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn local_path(target: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    if let Ok(url) = Url::parse(target) {
        return match url.scheme() {
            "file" => url.to_file_path().ok(),
            // single letter schemes are Windows drive letters
            scheme if scheme.len() == 1 => Some(PathBuf::from(target)),
            _ => None,
        };
    }
    let path = PathBuf::from(target);
    match base_dir {
        Some(base) if path.is_relative() => Some(base.join(path)),
        _ => Some(path),
    }
}

pub fn to_data_uri(image: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(image))
}

fn image_node(object: ImageObject) -> Node {
    Node::Entity(Entity::ImageObject(object))
}
