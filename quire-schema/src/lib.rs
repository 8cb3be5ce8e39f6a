//! The quire document node graph.
//!
//!     Documents are trees of [`Node`]s. A node is either a primitive (null,
//!     boolean, number, string, array, object), which is the shape raw execution
//!     outputs take, or an [`Entity`]: a typed record discriminated by its `type`
//!     property and serialised as JSON-LD.
//!
//!     The set of entity kinds is closed. Codecs match on [`Entity`]
//!     exhaustively, so a new kind cannot be added without deciding how every
//!     codec handles it. Objects whose `type` this version does not know still
//!     deserialise, as [`Node::Object`], so foreign payloads are never rejected
//!     outright.
//!
//!     The file structure:
//!     .
//!     ├── nodes.rs    # Node, Entity and the entity records
//!     ├── text.rs     # plain-text flattening
//!     └── csl.rs      # references <-> CSL-JSON records

pub mod csl;
pub mod nodes;
pub mod text;

pub use nodes::*;
pub use text::to_text;
