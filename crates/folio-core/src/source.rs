use roxmltree::{Node, ParsingOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Attribute, BreakKind, BreakMarker, Element, MarkupEvent};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to parse source document: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Decides which elements of the tag-mapped document are break markers and
/// which wrap annotatable words. Names are compared without namespace
/// prefixes.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Recognizer {
    pub page_break: Option<String>,
    pub column_break: Option<String>,
    pub annotatable: Option<String>,
    /// Page markers whose `type` attribute is listed here are dropped.
    pub skip_page_types: Vec<String>,
}

impl Default for Recognizer {
    fn default() -> Self {
        Self {
            page_break: Some("pb".to_string()),
            column_break: Some("cb".to_string()),
            annotatable: Some("mark".to_string()),
            skip_page_types: vec!["pdf".to_string()],
        }
    }
}

enum Role {
    PageBreak,
    ColumnBreak,
    Annotatable,
    Plain,
}

impl Recognizer {
    /// Recognizes nothing: every element is read as plain markup.
    pub fn none() -> Self {
        Self {
            page_break: None,
            column_break: None,
            annotatable: None,
            skip_page_types: Vec::new(),
        }
    }

    fn role(&self, name: &str) -> Role {
        if self.page_break.as_deref() == Some(name) {
            Role::PageBreak
        } else if self.column_break.as_deref() == Some(name) {
            Role::ColumnBreak
        } else if self.annotatable.as_deref() == Some(name) {
            Role::Annotatable
        } else {
            Role::Plain
        }
    }
}

/// Parses a tag-mapped document and flattens it into events in document
/// order. Comments and processing instructions are dropped.
pub fn read_events(source: &str, recognizer: &Recognizer) -> Result<Vec<MarkupEvent>, SourceError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(source, options)?;

    let mut events = Vec::new();
    walk(document.root_element(), recognizer, &mut events);
    Ok(events)
}

fn walk(node: Node<'_, '_>, recognizer: &Recognizer, events: &mut Vec<MarkupEvent>) {
    if node.is_text() {
        if let Some(text) = node.text() {
            events.push(MarkupEvent::Text(text.to_string()));
        }
        return;
    }
    if !node.is_element() {
        return;
    }

    let name = node.tag_name().name();
    // Break markers are empty by contract; anything inside one is ignored.
    match recognizer.role(name) {
        Role::PageBreak => {
            let skipped = node.attribute("type").is_some_and(|kind| {
                recognizer.skip_page_types.iter().any(|skip| skip == kind)
            });
            if !skipped {
                events.push(MarkupEvent::Break(marker(node, BreakKind::Page)));
            }
            return;
        }
        Role::ColumnBreak => {
            events.push(MarkupEvent::Break(marker(node, BreakKind::Column)));
            return;
        }
        Role::Annotatable => events.push(MarkupEvent::Open(element(node).mark_annotatable())),
        Role::Plain => events.push(MarkupEvent::Open(element(node))),
    }
    for child in node.children() {
        walk(child, recognizer, events);
    }
    events.push(MarkupEvent::Close(name.to_string()));
}

fn element(node: Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    element.attributes = attributes(node);
    element
}

fn marker(node: Node<'_, '_>, kind: BreakKind) -> BreakMarker {
    BreakMarker {
        kind,
        attributes: attributes(node),
    }
}

/// Namespaced attributes keep the prefix they were declared with, so `n`
/// and `tei:n` stay distinct.
fn attributes(node: Node<'_, '_>) -> Vec<Attribute> {
    node.attributes()
        .map(|attr| {
            let name = match attr.namespace() {
                None => attr.name().to_string(),
                Some(roxmltree::NS_XML_URI) => format!("xml:{}", attr.name()),
                Some(uri) => match node.lookup_prefix(uri) {
                    Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
                    _ => attr.name().to_string(),
                },
            };
            Attribute::new(name, attr.value())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Recognizer, read_events};
    use crate::event::{BreakKind, BreakMarker, Element, MarkupEvent};

    #[test]
    fn flattens_elements_text_and_attributes() {
        let events = read_events(
            "<div id=\"t\"><p class=\"x\" lang=\"es\">a<em>b</em></p><!-- note --></div>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events,
            vec![
                MarkupEvent::open_with("div", &[("id", "t")]),
                MarkupEvent::open_with("p", &[("class", "x"), ("lang", "es")]),
                MarkupEvent::text("a"),
                MarkupEvent::open("em"),
                MarkupEvent::text("b"),
                MarkupEvent::close("em"),
                MarkupEvent::close("p"),
                MarkupEvent::close("div"),
            ]
        );
    }

    #[test]
    fn recognizes_breaks_and_annotatable_words() {
        let events = read_events(
            "<body><pb n=\"1r\"/><p><mark>tobi</mark><cb n=\"2\"/></p></body>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events,
            vec![
                MarkupEvent::open("body"),
                MarkupEvent::Break(BreakMarker::new(BreakKind::Page).with_attr("n", "1r")),
                MarkupEvent::open("p"),
                MarkupEvent::Open(Element::new("mark").mark_annotatable()),
                MarkupEvent::text("tobi"),
                MarkupEvent::close("mark"),
                MarkupEvent::Break(BreakMarker::new(BreakKind::Column).with_attr("n", "2")),
                MarkupEvent::close("p"),
                MarkupEvent::close("body"),
            ]
        );
    }

    #[test]
    fn pdf_page_markers_are_dropped() {
        let events = read_events(
            "<body><pb type=\"pdf\" n=\"3\"/>x</body>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events,
            vec![
                MarkupEvent::open("body"),
                MarkupEvent::text("x"),
                MarkupEvent::close("body"),
            ]
        );
    }

    #[test]
    fn element_prefixes_are_dropped() {
        let events = read_events(
            "<tei:body xmlns:tei=\"http://www.tei-c.org/ns/1.0\"><tei:pb/></tei:body>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events,
            vec![
                MarkupEvent::open("body"),
                MarkupEvent::page_break(),
                MarkupEvent::close("body"),
            ]
        );
    }

    #[test]
    fn break_marker_content_is_skipped() {
        let events = read_events(
            "<body><pb n=\"2\">ignored<hi>too</hi></pb>kept</body>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events,
            vec![
                MarkupEvent::open("body"),
                MarkupEvent::Break(BreakMarker::new(BreakKind::Page).with_attr("n", "2")),
                MarkupEvent::text("kept"),
                MarkupEvent::close("body"),
            ]
        );
    }

    #[test]
    fn attribute_prefixes_are_kept() {
        let events = read_events(
            "<div xmlns:tei=\"http://www.tei-c.org/ns/1.0\" n=\"1\" tei:n=\"2\" xml:id=\"arte1\"/>",
            &Recognizer::default(),
        )
        .expect("read");
        assert_eq!(
            events[0],
            MarkupEvent::open_with("div", &[("n", "1"), ("tei:n", "2"), ("xml:id", "arte1")])
        );
    }

    #[test]
    fn recognizer_none_reads_plain_markup() {
        let events = read_events("<p><pb/><mark>w</mark></p>", &Recognizer::none()).expect("read");
        assert_eq!(events[1], MarkupEvent::open("pb"));
        assert_eq!(events[3], MarkupEvent::open("mark"));
    }

    #[test]
    fn malformed_source_is_an_error() {
        assert!(read_events("<p><em></p>", &Recognizer::default()).is_err());
    }
}
