//! Attribute triples <-> attribute maps.
//!
//! Pandoc elements carry attributes as `(id, classes, key/value pairs)`. Nodes
//! carry them as a flat map. The mapping:
//!
//! | Triple part      | Map entry                                    |
//! |------------------|----------------------------------------------|
//! | non-empty id     | `id`                                         |
//! | non-empty classes| `classes` (space separated)                  |
//! | `(key, value)`   | `key`, or its rename from the caller's table |
//!
//! The rename table lets callers give wire-specific keys generic names, e.g.
//! the `custom-style` key docx round trips become `style` on nodes.

use crate::ast::Attr;
use quire_schema::{Attributes, Node};
use std::collections::BTreeMap;

/// Flat string attribute map.
pub type AttrMap = BTreeMap<String, String>;

/// Renames as `(wire key, map key)` pairs.
pub type Renames<'a> = &'a [(&'a str, &'a str)];

/// Renames applied by the transcoder in both directions.
pub const STYLE_RENAMES: Renames<'static> = &[("custom-style", "style")];

/// Decodes a triple into a map, or `None` when the triple is empty.
pub fn decode_attrs(attr: &Attr, renames: Renames<'_>) -> Option<AttrMap> {
    let (id, classes, pairs) = attr;
    if id.is_empty() && classes.is_empty() && pairs.is_empty() {
        return None;
    }

    let mut map = AttrMap::new();
    if !id.is_empty() {
        map.insert("id".to_string(), id.clone());
    }
    if !classes.is_empty() {
        map.insert("classes".to_string(), classes.join(" "));
    }
    for (key, value) in pairs {
        let key = renames
            .iter()
            .find(|(wire, _)| wire == key)
            .map(|(_, renamed)| renamed.to_string())
            .unwrap_or_else(|| key.clone());
        map.insert(key, value.clone());
    }
    Some(map)
}

/// Encodes a map into a triple.
pub fn encode_attrs(map: &AttrMap) -> Attr {
    encode_attrs_with(map, &[])
}

/// Encodes a map into a triple, reversing the given renames.
pub fn encode_attrs_with(map: &AttrMap, renames: Renames<'_>) -> Attr {
    let id = map.get("id").cloned().unwrap_or_default();
    let classes = map
        .get("classes")
        .map(|classes| classes.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let pairs = map
        .iter()
        .filter(|(key, _)| key.as_str() != "id" && key.as_str() != "classes")
        .map(|(key, value)| {
            let key = renames
                .iter()
                .find(|(_, renamed)| renamed == key)
                .map(|(wire, _)| wire.to_string())
                .unwrap_or_else(|| key.clone());
            (key, value.clone())
        })
        .collect();
    (id, classes, pairs)
}

/// Converts a node attribute bag into a string map.
///
/// Non-string values are carried as their JSON text; they come back as strings.
pub fn from_node_attrs(attrs: &Attributes) -> AttrMap {
    attrs
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Node::String(text) => text.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            };
            (key.clone(), text)
        })
        .collect()
}

/// Converts a string map into a node attribute bag.
pub fn to_node_attrs(map: AttrMap) -> Attributes {
    map.into_iter()
        .map(|(key, value)| (key, Node::String(value)))
        .collect()
}
