use crate::common::{para, round_trip, strong, text};
use quire_schema::{
    Attributes, CodeBlock, CodeFragment, Collection, Entity, Figure, Heading, ImageObject, Link,
    List, ListItem, ListOrder, Mark, Math, Node, Note, Quote, QuoteBlock, Table, TableCell,
    TableRow, TableRowType, ThematicBreak,
};

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), text(value)))
        .collect()
}

fn item(content: Vec<Node>, is_checked: Option<bool>) -> Node {
    Node::Entity(Entity::ListItem(ListItem {
        content,
        is_checked,
        ..Default::default()
    }))
}

fn cell(content: &str) -> Node {
    Node::Entity(Entity::TableCell(TableCell {
        content: vec![text(content)],
        ..Default::default()
    }))
}

fn row(cells: &[&str], row_type: Option<TableRowType>) -> Node {
    Node::Entity(Entity::TableRow(TableRow {
        cells: cells.iter().map(|value| cell(value)).collect(),
        row_type,
        ..Default::default()
    }))
}

fn tex(text: &str) -> Math {
    Math {
        text: text.to_string(),
        math_language: Some("tex".to_string()),
        ..Default::default()
    }
}

fn assert_round_trip(content: Vec<Node>) {
    assert_eq!(round_trip(content.clone()), content);
}

#[test]
fn test_headings_and_paragraphs() {
    assert_round_trip(vec![
        Node::Entity(Entity::Heading(Heading {
            depth: 2,
            content: vec![text("Introduction")],
            attrs: attrs(&[("id", "intro")]),
        })),
        para(vec![text("Hello "), strong(vec![text("world")]), text("!")]),
    ]);
}

#[test]
fn test_paragraph_attributes_survive_in_a_div() {
    let mut paragraph = quire_schema::Paragraph::new(vec![text("styled")]);
    paragraph.attrs = attrs(&[("id", "p1"), ("style", "Abstract")]);
    assert_round_trip(vec![Node::Entity(Entity::Paragraph(paragraph))]);
}

#[test]
fn test_marks() {
    let mark = |content: &str| Mark::new(vec![text(content)]);
    assert_round_trip(vec![para(vec![
        Node::Entity(Entity::Emphasis(mark("em"))),
        text(" "),
        Node::Entity(Entity::Delete(mark("gone"))),
        text(" H"),
        Node::Entity(Entity::Subscript(mark("2"))),
        text("O x"),
        Node::Entity(Entity::Superscript(mark("2"))),
    ])]);
}

#[test]
fn test_quotes() {
    assert_round_trip(vec![
        Node::Entity(Entity::QuoteBlock(QuoteBlock {
            content: vec![para(vec![text("quoted block")])],
            ..Default::default()
        })),
        para(vec![
            Node::Entity(Entity::Quote(Quote {
                content: vec![text("double")],
                ..Default::default()
            })),
            text(" and "),
            Node::Entity(Entity::Quote(Quote {
                content: vec![text("single")],
                attrs: attrs(&[("quote", "single")]),
                ..Default::default()
            })),
        ]),
    ]);
}

#[test]
fn test_code() {
    assert_round_trip(vec![
        Node::Entity(Entity::CodeBlock(CodeBlock {
            text: "x <- 1\nprint(x)".to_string(),
            programming_language: Some("r".to_string()),
            ..Default::default()
        })),
        para(vec![
            text("call "),
            Node::Entity(Entity::CodeFragment(CodeFragment {
                text: "main()".to_string(),
                programming_language: Some("python".to_string()),
                ..Default::default()
            })),
        ]),
    ]);
}

#[test]
fn test_lists() {
    assert_round_trip(vec![
        Node::Entity(Entity::List(List {
            items: vec![
                item(vec![para(vec![text("one")])], None),
                item(vec![para(vec![text("two")])], None),
            ],
            order: ListOrder::Unordered,
            ..Default::default()
        })),
        Node::Entity(Entity::List(List {
            items: vec![item(vec![para(vec![text("first")])], None)],
            order: ListOrder::Ascending,
            ..Default::default()
        })),
    ]);
}

#[test]
fn test_task_lists() {
    assert_round_trip(vec![Node::Entity(Entity::List(List {
        items: vec![
            item(vec![para(vec![text("done")])], Some(true)),
            item(vec![para(vec![text("todo")])], Some(false)),
        ],
        order: ListOrder::Unordered,
        ..Default::default()
    }))]);
}

#[test]
fn test_descending_lists_come_back_ascending() {
    let list = |order| {
        Node::Entity(Entity::List(List {
            items: vec![item(vec![para(vec![text("last")])], None)],
            order,
            ..Default::default()
        }))
    };
    assert_eq!(
        round_trip(vec![list(ListOrder::Descending)]),
        vec![list(ListOrder::Ascending)]
    );
}

#[test]
fn test_tables_with_captions() {
    assert_round_trip(vec![Node::Entity(Entity::Table(Table {
        rows: vec![
            row(&["Name", "Score"], Some(TableRowType::Header)),
            row(&["Ada", "10"], None),
            row(&["Grace", "9"], None),
        ],
        label: Some("Table 1".to_string()),
        caption: Some(vec![para(vec![text("Results by person")])]),
        ..Default::default()
    }))]);
}

#[test]
fn test_tables_without_header() {
    assert_round_trip(vec![Node::Entity(Entity::Table(Table {
        rows: vec![row(&["a", "b"], None)],
        ..Default::default()
    }))]);
}

#[test]
fn test_figures() {
    assert_round_trip(vec![Node::Entity(Entity::Figure(Figure {
        content: vec![Node::Entity(Entity::ImageObject(ImageObject::new(
            "plots/cat.png",
        )))],
        label: Some("Figure 1".to_string()),
        caption: Some(vec![para(vec![text("A cat.")])]),
        ..Default::default()
    }))]);
}

#[test]
fn test_math() {
    assert_round_trip(vec![
        Node::Entity(Entity::MathBlock(tex("\\int_0^1 x\\,dx"))),
        para(vec![
            text("where "),
            Node::Entity(Entity::MathFragment(tex("x > 0"))),
        ]),
    ]);
}

#[test]
fn test_links_images_and_notes() {
    let mut image = ImageObject::new("https://example.org/logo.png");
    image.caption = Some(vec![text("the logo")]);
    image.title = Some("Logo".to_string());
    assert_round_trip(vec![para(vec![
        Node::Entity(Entity::Link(Link {
            content: vec![text("example")],
            target: "https://example.org".to_string(),
            title: Some("Example".to_string()),
            ..Default::default()
        })),
        text(" "),
        Node::Entity(Entity::ImageObject(image)),
        Node::Entity(Entity::Note(Note {
            content: vec![para(vec![text("a footnote")])],
            ..Default::default()
        })),
    ])]);
}

#[test]
fn test_block_images_stay_blocks() {
    assert_round_trip(vec![Node::Entity(Entity::ImageObject(ImageObject::new(
        "figure.png",
    )))]);
}

#[test]
fn test_collections_and_breaks() {
    assert_round_trip(vec![
        Node::Entity(Entity::Collection(Collection {
            parts: vec![para(vec![text("part one")]), para(vec![text("part two")])],
            ..Default::default()
        })),
        Node::Entity(Entity::ThematicBreak(ThematicBreak::default())),
    ]);
}
