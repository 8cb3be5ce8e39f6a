//! Node graph <-> Pandoc AST transcoding.
//!
//! Each direction runs in two stages:
//!
//! | Direction | Async stage ([`prepass`])              | Sync stage                  |
//! |-----------|----------------------------------------|-----------------------------|
//! | decode    | sniff images for embedded nodes        | [`decode_document`]         |
//! | encode    | translate math, rasterize code to rPNG | [`encode_node`]             |
//!
//! The sync stages are total: kinds without a mapping are logged and replaced
//! by empty content rather than failing the document.
//!
//! Structure Pandoc lacks travels in `custom-style` attributes on `Div`s and
//! `Span`s, using the names in [`styles`].

pub mod decode;
pub mod encode;
mod meta;
pub mod prepass;

pub use decode::decode_document;
pub use encode::encode_node;
pub use meta::{NULL_SENTINEL, NUMBER_PREFIX};
pub use prepass::{
    inline_media, resolve_images, resolve_nodes, DecodeContext, EncodeContext, Resolved,
};

/// Style names used for structure Pandoc cannot express.
pub mod styles {
    pub const CODE_CHUNK: &str = "CodeChunk";
    pub const CODE_EXPRESSION: &str = "CodeExpression";
    pub const CODE_CHUNK_CAPTION: &str = "CodeChunkCaption";
    pub const FIGURE: &str = "Figure";
    pub const FIGURE_CAPTION: &str = "FigureCaption";
    pub const TABLE_CAPTION: &str = "TableCaption";
    pub const COLLECTION: &str = "Collection";

    /// Styles that carry structure and never end up in a node's attributes.
    pub const RESERVED: &[&str] = &[
        CODE_CHUNK,
        CODE_EXPRESSION,
        CODE_CHUNK_CAPTION,
        FIGURE,
        FIGURE_CAPTION,
        TABLE_CAPTION,
        COLLECTION,
    ];

    /// Attributes a rasterized code chunk uses to hand its label and caption
    /// to the encoder.
    pub const CAPTION_LABEL: &str = "caption-label";
    pub const CAPTION_CONTENT: &str = "caption-content";

    /// Styles word processors attach to everything.
    pub const MEANINGLESS: &[&str] = &[
        "Normal",
        "Default",
        "Body Text",
        "First Paragraph",
        "Compact",
        "Default Paragraph Font",
        "Plain Text",
        "Source Code",
    ];

    /// Whether a style should be dropped when merging container attributes.
    pub fn is_filtered(style: &str) -> bool {
        RESERVED.contains(&style) || MEANINGLESS.contains(&style)
    }
}
