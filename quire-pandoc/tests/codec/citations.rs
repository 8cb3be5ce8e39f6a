use crate::common::{para, round_trip, text};
use quire_pandoc::ast::{self, Citation, CitationMode as PandocMode, Inline};
use quire_pandoc::codec::encode_node;
use quire_schema::{Cite, CiteGroup, CitationMode, Entity, Node};

fn cite(target: &str, mode: CitationMode) -> Node {
    Node::Entity(Entity::Cite(Cite {
        citation_mode: mode,
        ..Cite::new(target)
    }))
}

fn citations_of(node: &Node) -> Vec<Citation> {
    let doc = encode_node(node);
    let [ast::Block::Para(inlines)] = doc.blocks.as_slice() else {
        panic!("expected one paragraph, got {:?}", doc.blocks);
    };
    match inlines.as_slice() {
        [Inline::Cite(citations, _)] => citations.clone(),
        other => panic!("expected one Cite, got {other:?}"),
    }
}

#[test]
fn test_modes_map_both_ways() {
    for (mode, pandoc) in [
        (CitationMode::Parenthetical, PandocMode::NormalCitation),
        (CitationMode::Narrative, PandocMode::AuthorInText),
        (CitationMode::NarrativeYear, PandocMode::SuppressAuthor),
    ] {
        let node = cite("smith2019", mode);
        let citations = citations_of(&node);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].citation_mode, pandoc);
        assert_eq!(citations[0].citation_id, "smith2019");

        assert_eq!(round_trip(vec![para(vec![node.clone()])]), vec![para(vec![node])]);
    }
}

#[test]
fn test_one_citation_is_a_cite_and_several_a_group() {
    let group = Node::Entity(Entity::CiteGroup(CiteGroup {
        items: vec![
            cite("a", CitationMode::Parenthetical),
            cite("b", CitationMode::Parenthetical),
            cite("c", CitationMode::Narrative),
        ],
        ..Default::default()
    }));
    assert_eq!(citations_of(&group).len(), 3);

    let decoded = round_trip(vec![para(vec![group.clone()])]);
    assert_eq!(decoded, vec![para(vec![group])]);

    let single = cite("a", CitationMode::Parenthetical);
    assert_eq!(citations_of(&single).len(), 1);
    let decoded = round_trip(vec![para(vec![single.clone()])]);
    assert!(matches!(
        &decoded[..],
        [Node::Entity(Entity::Paragraph(p))] if matches!(&p.content[..], [Node::Entity(Entity::Cite(_))])
    ));
}

#[test]
fn test_prefix_and_suffix() {
    let node = Node::Entity(Entity::Cite(Cite {
        citation_prefix: Some(vec![text("see")]),
        citation_suffix: Some(vec![text(", p. 4")]),
        ..Cite::new("doe2020")
    }));
    let citations = citations_of(&node);
    assert_eq!(citations[0].citation_prefix, vec![Inline::Str("see".to_string())]);
    assert_eq!(round_trip(vec![para(vec![node.clone()])]), vec![para(vec![node])]);
}
