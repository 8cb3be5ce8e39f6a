//! Bibliographic records in CSL-JSON form.
//!
//! References are modelled as `Article` entities. Citation processors consume
//! flat CSL records instead, so this module converts between the two:
//!
//! | Article field    | CSL field                  |
//! |------------------|----------------------------|
//! | `attrs.id`       | `id`                       |
//! | `title`          | `title` (plain text)       |
//! | `authors`        | `author` (`given`/`family`)|
//! | `datePublished`  | `issued.date-parts`        |
//!
//! Date parts may arrive as numbers or numeric strings (records that travelled
//! through document metadata lose their numeric type); both are accepted.

use crate::nodes::{Article, Attributes, Entity, Node, Person};
use crate::text::inlines_to_text;
use serde_json::{json, Map, Value};

/// Converts a reference node into a CSL record.
///
/// Returns `None` for nodes that are not `Article`s. `fallback_id` is used when
/// the reference carries no `id` attribute.
pub fn to_csl(node: &Node, fallback_id: &str) -> Option<Value> {
    let article = match node {
        Node::Entity(Entity::Article(article)) => article,
        _ => return None,
    };

    let mut record = Map::new();
    let id = article
        .attrs
        .get("id")
        .and_then(Node::as_str)
        .unwrap_or(fallback_id);
    record.insert("id".to_string(), Value::String(id.to_string()));
    record.insert("type".to_string(), Value::String("article".to_string()));

    if let Some(title) = &article.title {
        record.insert("title".to_string(), Value::String(inlines_to_text(title)));
    }

    if let Some(authors) = &article.authors {
        let names: Vec<Value> = authors.iter().filter_map(person_to_csl).collect();
        if !names.is_empty() {
            record.insert("author".to_string(), Value::Array(names));
        }
    }

    if let Some(date) = &article.date_published {
        let issued = match date_parts(date) {
            Some(parts) => json!({ "date-parts": [parts] }),
            None => json!({ "raw": date }),
        };
        record.insert("issued".to_string(), issued);
    }

    Some(Value::Object(record))
}

/// `YYYY[-MM[-DD]]`, ignoring any time of day. `None` when a part is not a
/// number.
fn date_parts(date: &str) -> Option<Vec<i64>> {
    let day = date.split(['T', ' ']).next().unwrap_or_default().trim();
    if day.is_empty() {
        return None;
    }
    day.split('-')
        .map(|part| part.parse::<i64>().ok())
        .collect()
}

fn person_to_csl(node: &Node) -> Option<Value> {
    match node {
        Node::Entity(Entity::Person(person)) => {
            let mut name = Map::new();
            if !person.family_names.is_empty() {
                name.insert(
                    "family".to_string(),
                    Value::String(person.family_names.join(" ")),
                );
            }
            if !person.given_names.is_empty() {
                name.insert(
                    "given".to_string(),
                    Value::String(person.given_names.join(" ")),
                );
            }
            Some(Value::Object(name))
        }
        Node::String(literal) => Some(json!({ "literal": literal })),
        _ => None,
    }
}

/// Converts a CSL record into a reference node.
///
/// Returns `None` when the value is not a JSON object.
pub fn from_csl(record: &Value) -> Option<Node> {
    let record = record.as_object()?;
    let mut attrs = Attributes::new();
    if let Some(id) = record.get("id").and_then(value_as_string) {
        attrs.insert("id".to_string(), Node::String(id));
    }

    let title = record
        .get("title")
        .and_then(Value::as_str)
        .map(|title| vec![Node::text(title)]);

    let authors = record.get("author").and_then(Value::as_array).map(|names| {
        names
            .iter()
            .filter_map(person_from_csl)
            .map(|person| Node::Entity(Entity::Person(person)))
            .collect::<Vec<_>>()
    });

    let date_published = record.get("issued").and_then(date_from_csl);

    Some(Node::Entity(Entity::Article(Article {
        title,
        authors,
        date_published,
        attrs,
        ..Default::default()
    })))
}

fn person_from_csl(name: &Value) -> Option<Person> {
    let name = name.as_object()?;
    if let Some(literal) = name.get("literal").and_then(Value::as_str) {
        return Some(Person::from_name(literal));
    }
    let split = |key: &str| -> Vec<String> {
        name.get(key)
            .and_then(Value::as_str)
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    };
    Some(Person {
        given_names: split("given"),
        family_names: split("family"),
        attrs: Attributes::new(),
    })
}

fn date_from_csl(issued: &Value) -> Option<String> {
    if let Some(raw) = issued.get("raw").and_then(Value::as_str) {
        return Some(raw.to_string());
    }
    let parts = issued
        .get("date-parts")?
        .as_array()?
        .first()?
        .as_array()?
        .iter()
        .filter_map(value_as_i64)
        .collect::<Vec<_>>();

    let mut iter = parts.iter();
    let year = iter.next()?;
    let mut date = year.to_string();
    for part in iter {
        date.push_str(&format!("-{part:02}"));
    }
    Some(date)
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
