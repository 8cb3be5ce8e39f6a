//! Article properties <-> document metadata.
//!
//! | Article field   | Meta key       | Meta value                         |
//! |-----------------|----------------|------------------------------------|
//! | `title`         | `title`        | MetaInlines                        |
//! | `authors`       | `author`       | MetaList of MetaInlines (names)    |
//! | `datePublished` | `date`         | MetaString                         |
//! | `references`    | `references`   | MetaList of CSL records            |
//! | attributes      | attribute name | by value type (see below)          |
//!
//! Metadata has no null or number. Both travel as `MetaString`s: null as
//! [`NULL_SENTINEL`], numbers behind [`NUMBER_PREFIX`]. Decoding inverts both
//! and also takes the references of external `bibliography` files, which the
//! decode pre-pass reads (see [`read_bibliography`]).

use super::decode::Decoder;
use super::encode::{encode_block, encode_inline, encode_inlines, is_block};
use super::prepass::DecodeContext;
use crate::ast::{Inline, Meta, MetaValue};
use crate::bridge;
use quire_schema::text::format_number;
use quire_schema::{csl, Article, Attributes, Entity, Node, Person};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Metadata string standing in for null.
pub const NULL_SENTINEL: &str = "::null::";

/// Prefix marking a metadata string as a number.
pub const NUMBER_PREFIX: &str = "::number::";

const TITLE: &str = "title";
const AUTHOR: &str = "author";
const DATE: &str = "date";
const REFERENCES: &str = "references";
const BIBLIOGRAPHY: &str = "bibliography";

pub(crate) fn encode_meta(article: &Article) -> Meta {
    let mut meta = Meta::new();
    if let Some(title) = &article.title {
        meta.insert(TITLE.to_string(), MetaValue::MetaInlines(encode_inlines(title)));
    }
    if let Some(authors) = &article.authors {
        let names = authors
            .iter()
            .map(|author| match author {
                Node::Entity(Entity::Person(person)) => {
                    MetaValue::MetaInlines(encode_inline(&Node::text(person.full_name())))
                }
                other => MetaValue::MetaInlines(encode_inline(other)),
            })
            .collect();
        meta.insert(AUTHOR.to_string(), MetaValue::MetaList(names));
    }
    if let Some(date) = &article.date_published {
        meta.insert(DATE.to_string(), MetaValue::MetaString(date.clone()));
    }
    if let Some(references) = &article.references {
        let records = references
            .iter()
            .enumerate()
            .filter_map(|(index, reference)| {
                let record = csl::to_csl(reference, &format!("ref{}", index + 1));
                if record.is_none() {
                    tracing::warn!(kind = reference.kind(), "reference is not an Article");
                }
                record
            })
            .map(|record| value_to_meta(&record))
            .collect();
        meta.insert(REFERENCES.to_string(), MetaValue::MetaList(records));
    }
    for (key, value) in &article.attrs {
        meta.insert(key.clone(), node_to_meta(value));
    }
    meta
}

fn node_to_meta(node: &Node) -> MetaValue {
    match node {
        Node::Null => MetaValue::MetaString(NULL_SENTINEL.to_string()),
        Node::Boolean(value) => MetaValue::MetaBool(*value),
        Node::Number(value) => {
            MetaValue::MetaString(format!("{NUMBER_PREFIX}{}", format_number(*value)))
        }
        Node::String(text) => MetaValue::MetaString(text.clone()),
        Node::Array(items) => MetaValue::MetaList(items.iter().map(node_to_meta).collect()),
        Node::Object(map) => MetaValue::MetaMap(
            map.iter()
                .map(|(key, value)| (key.clone(), node_to_meta(value)))
                .collect(),
        ),
        Node::Entity(_) if is_block(node) => MetaValue::MetaBlocks(encode_block(node)),
        Node::Entity(_) => MetaValue::MetaInlines(encode_inline(node)),
    }
}

/// CSL records travel as metadata; numbers become plain strings.
fn value_to_meta(value: &Value) -> MetaValue {
    match value {
        Value::Null => MetaValue::MetaString(String::new()),
        Value::Bool(value) => MetaValue::MetaBool(*value),
        Value::Number(number) => MetaValue::MetaString(number.to_string()),
        Value::String(text) => MetaValue::MetaString(text.clone()),
        Value::Array(items) => MetaValue::MetaList(items.iter().map(value_to_meta).collect()),
        Value::Object(map) => MetaValue::MetaMap(
            map.iter()
                .map(|(key, value)| (key.clone(), value_to_meta(value)))
                .collect(),
        ),
    }
}

pub(crate) fn decode_meta(meta: &Meta, decoder: &Decoder) -> Article {
    let mut article = Article::default();
    let mut attrs = Attributes::new();

    for (key, value) in meta {
        match key.as_str() {
            TITLE => article.title = Some(meta_inlines(value, decoder)),
            AUTHOR => article.authors = Some(decode_authors(value, decoder)),
            DATE => article.date_published = Some(meta_text(value)),
            REFERENCES => {
                let references = decode_references(value);
                article
                    .references
                    .get_or_insert_with(Vec::new)
                    .extend(references);
            }
            BIBLIOGRAPHY => {
                let references = decoder.resolved().references().iter().cloned();
                article
                    .references
                    .get_or_insert_with(Vec::new)
                    .extend(references);
            }
            _ => {
                if let Some(node) = meta_to_node(value, decoder) {
                    attrs.insert(key.clone(), node);
                }
            }
        }
    }

    article.attrs = attrs;
    article
}

fn meta_to_node(value: &MetaValue, decoder: &Decoder) -> Option<Node> {
    let node = match value {
        MetaValue::MetaBool(value) => Node::Boolean(*value),
        MetaValue::MetaString(text) => untunnel(text),
        MetaValue::MetaInlines(inlines) => match decoder.inlines(inlines).as_slice() {
            [] => Node::String(String::new()),
            [Node::String(text)] => untunnel(text),
            [single] => single.clone(),
            nodes => Node::Array(nodes.to_vec()),
        },
        MetaValue::MetaBlocks(blocks) => match decoder.blocks(blocks).as_slice() {
            [single] => single.clone(),
            nodes => Node::Array(nodes.to_vec()),
        },
        MetaValue::MetaList(items) => Node::Array(
            items
                .iter()
                .filter_map(|item| meta_to_node(item, decoder))
                .collect(),
        ),
        MetaValue::MetaMap(map) => Node::Object(
            map.iter()
                .filter_map(|(key, value)| Some((key.clone(), meta_to_node(value, decoder)?)))
                .collect::<BTreeMap<_, _>>(),
        ),
        MetaValue::Unknown(tag) => {
            tracing::error!(kind = tag.as_str(), "unknown metadata value");
            return None;
        }
    };
    Some(node)
}

fn untunnel(text: &str) -> Node {
    if text == NULL_SENTINEL {
        return Node::Null;
    }
    if let Some(number) = text.strip_prefix(NUMBER_PREFIX) {
        match number.parse::<f64>() {
            Ok(value) => return Node::Number(value),
            Err(_) => tracing::warn!(text, "malformed number in metadata, keeping text"),
        }
    }
    Node::String(text.to_string())
}

fn meta_inlines(value: &MetaValue, decoder: &Decoder) -> Vec<Node> {
    match value {
        MetaValue::MetaInlines(inlines) => decoder.inlines(inlines),
        MetaValue::MetaBlocks(blocks) => {
            let inlines: Vec<Inline> = blocks
                .iter()
                .flat_map(|block| match block {
                    crate::ast::Block::Para(inlines) | crate::ast::Block::Plain(inlines) => {
                        inlines.clone()
                    }
                    _ => Vec::new(),
                })
                .collect();
            decoder.inlines(&inlines)
        }
        other => vec![Node::String(meta_text(other))],
    }
}

/// Flattens a metadata value to plain text.
pub(crate) fn meta_text(value: &MetaValue) -> String {
    match value {
        MetaValue::MetaString(text) => text.clone(),
        MetaValue::MetaBool(value) => value.to_string(),
        MetaValue::MetaInlines(inlines) => super::decode::plain_text(inlines),
        MetaValue::MetaBlocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                crate::ast::Block::Para(inlines) | crate::ast::Block::Plain(inlines) => {
                    Some(super::decode::plain_text(inlines))
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        MetaValue::MetaList(items) => items.iter().map(meta_text).collect::<Vec<_>>().join(", "),
        MetaValue::MetaMap(_) | MetaValue::Unknown(_) => String::new(),
    }
}

fn decode_authors(value: &MetaValue, decoder: &Decoder) -> Vec<Node> {
    let items = match value {
        MetaValue::MetaList(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .filter_map(|item| decode_author(item, decoder))
        .collect()
}

fn decode_author(value: &MetaValue, decoder: &Decoder) -> Option<Node> {
    let person = match value {
        MetaValue::MetaMap(map) => {
            let part = |key: &str| -> Vec<String> {
                map.get(key)
                    .map(meta_text)
                    .map(|text| text.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default()
            };
            match map.get("name") {
                Some(name) if !map.contains_key("family") => Person::from_name(&meta_text(name)),
                _ => Person {
                    given_names: part("given"),
                    family_names: part("family"),
                    attrs: Attributes::new(),
                },
            }
        }
        MetaValue::Unknown(tag) => {
            tracing::error!(kind = tag.as_str(), "unknown author value");
            return None;
        }
        other => {
            let name = match other {
                MetaValue::MetaInlines(inlines) => {
                    quire_schema::text::inlines_to_text(&decoder.inlines(inlines))
                }
                _ => meta_text(other),
            };
            Person::from_name(&name)
        }
    };
    Some(Node::Entity(Entity::Person(person)))
}

fn decode_references(value: &MetaValue) -> Vec<Node> {
    let MetaValue::MetaList(items) = value else {
        tracing::warn!("references metadata is not a list");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| csl::from_csl(&meta_to_value(item)))
        .collect()
}

fn meta_to_value(value: &MetaValue) -> Value {
    match value {
        MetaValue::MetaMap(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), meta_to_value(value)))
                .collect::<Map<_, _>>(),
        ),
        MetaValue::MetaList(items) => Value::Array(items.iter().map(meta_to_value).collect()),
        MetaValue::MetaBool(value) => Value::Bool(*value),
        other => Value::String(meta_text(other)),
    }
}

/// Paths named by the `bibliography` key, one or a list.
pub(crate) fn bibliography_paths(meta: &Meta) -> Vec<String> {
    match meta.get(BIBLIOGRAPHY) {
        Some(MetaValue::MetaList(items)) => items.iter().map(meta_text).collect(),
        Some(value) => vec![meta_text(value)],
        None => Vec::new(),
    }
}

/// Reads a bibliography relative to the source directory. CSL-JSON is parsed
/// directly; other formats are converted by `pandoc-citeproc`. Failures are
/// logged and yield no references.
pub(crate) async fn read_bibliography(path: &str, context: &DecodeContext) -> Vec<Node> {
    let path = match &context.source_dir {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path),
    };
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let json = if is_json {
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| err.to_string())
    } else {
        bridge::bib_to_csl(&path, context.citeproc_binary.as_deref())
            .await
            .map_err(|err| err.to_string())
    };
    let records = json.and_then(|json| {
        serde_json::from_str::<Value>(&json).map_err(|err| err.to_string())
    });
    match records {
        Ok(records) => records
            .as_array()
            .map(|records| records.iter().filter_map(csl::from_csl).collect())
            .unwrap_or_default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unable to read bibliography");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::prepass::Resolved;

    fn roundtrip(article: &Article) -> Article {
        let resolved = Resolved::default();
        let decoder = Decoder::new(&resolved);
        decode_meta(&encode_meta(article), &decoder)
    }

    #[test]
    fn tunnels_null_and_numbers() {
        let mut article = Article::default();
        article.attrs.insert("draft".to_string(), Node::Null);
        article.attrs.insert("version".to_string(), Node::Number(2.5));
        article.attrs.insert("pages".to_string(), Node::Number(12.0));
        article.attrs.insert("reviewed".to_string(), Node::Boolean(true));

        let meta = encode_meta(&article);
        assert_eq!(meta["draft"], MetaValue::MetaString("::null::".to_string()));
        assert_eq!(meta["pages"], MetaValue::MetaString("::number::12".to_string()));

        assert_eq!(roundtrip(&article).attrs, article.attrs);
    }

    #[test]
    fn authors_title_and_date_round_trip() {
        let article = Article {
            title: Some(vec![Node::text("On Quires")]),
            authors: Some(vec![Node::Entity(Entity::Person(Person::new("Ada", "Lovelace")))]),
            date_published: Some("1843-09-01".to_string()),
            ..Default::default()
        };
        assert_eq!(roundtrip(&article), article);
    }

    #[test]
    fn author_maps_are_accepted() {
        let mut map = BTreeMap::new();
        map.insert("given".to_string(), MetaValue::MetaString("Grace".to_string()));
        map.insert("family".to_string(), MetaValue::MetaString("Hopper".to_string()));
        let resolved = Resolved::default();
        let authors = decode_authors(&MetaValue::MetaList(vec![MetaValue::MetaMap(map)]), &Decoder::new(&resolved));
        assert_eq!(
            authors,
            vec![Node::Entity(Entity::Person(Person::new("Grace", "Hopper")))]
        );
    }

    #[test]
    fn references_become_csl_records() {
        let mut reference = Article {
            title: Some(vec![Node::text("A Paper")]),
            date_published: Some("2019".to_string()),
            ..Default::default()
        };
        reference
            .attrs
            .insert("id".to_string(), Node::text("smith2019"));
        let article = Article {
            references: Some(vec![Node::Entity(Entity::Article(reference.clone()))]),
            ..Default::default()
        };

        let meta = encode_meta(&article);
        let MetaValue::MetaList(records) = &meta["references"] else {
            panic!("references should be a list");
        };
        let MetaValue::MetaMap(record) = &records[0] else {
            panic!("record should be a map");
        };
        assert_eq!(record["id"], MetaValue::MetaString("smith2019".to_string()));

        let back = roundtrip(&article);
        assert_eq!(
            back.references,
            Some(vec![Node::Entity(Entity::Article(reference))])
        );
    }

    #[tokio::test]
    async fn bibliography_is_resolved_against_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("refs.json"),
            r#"[{"id": "doe", "title": "Notes", "author": [{"given": "Jane", "family": "Doe"}]}]"#,
        )
        .unwrap();
        let context = DecodeContext {
            source_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let references = read_bibliography("refs.json", &context).await;
        assert_eq!(references.len(), 1);

        let mut meta = Meta::new();
        meta.insert(
            "bibliography".to_string(),
            MetaValue::MetaString("refs.json".to_string()),
        );
        let mut resolved = Resolved::default();
        resolved.add_references(references);
        let article = decode_meta(&meta, &Decoder::new(&resolved));
        assert_eq!(article.references.map(|refs| refs.len()), Some(1));
        assert!(article.attrs.is_empty());
    }

    #[test]
    fn bibliography_accepts_a_list_of_paths() {
        let mut meta = Meta::new();
        meta.insert(
            "bibliography".to_string(),
            MetaValue::MetaList(vec![
                MetaValue::MetaString("a.bib".to_string()),
                MetaValue::MetaInlines(vec![Inline::Str("b.yaml".to_string())]),
            ]),
        );
        assert_eq!(bibliography_paths(&meta), vec!["a.bib", "b.yaml"]);
    }

    #[tokio::test]
    async fn unreadable_bibliography_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let context = DecodeContext {
            source_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(read_bibliography("absent.json", &context).await.is_empty());
    }
}
