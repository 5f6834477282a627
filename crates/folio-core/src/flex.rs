//! Import of FieldWorks Language Explorer (FLEx) interlinear exports.
//!
//! An export lists, per interlinear text, every analysed word in text
//! order. Each one becomes an [`AnnotationRecord`] whose key is the word as
//! written and whose payload is a small gloss table:
//!
//! ```text
//! <table>
//!   <caption>name</caption>
//!   <tr><td>morph</td>...</tr>
//!   <tr><td>gloss</td>...</tr>
//!   <tr><td colspan="n">'literal gloss'</td></tr>
//! </table>
//! ```
//!
//! The morph and gloss rows are left out unless at least one morph and one
//! gloss are non-empty.

use roxmltree::Node;
use thiserror::Error;
use tracing::debug;

use crate::annotate::AnnotationRecord;
use crate::event::MarkupEvent;
use crate::serialize::{SerializationError, SerializeOptions, serialize};

#[derive(Debug, Error)]
pub enum FlexError {
    #[error("failed to parse FLEx export: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("failed to render FLEx annotation: {0}")]
    Render(#[from] SerializationError),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlexWord {
    pub name: String,
    pub morphs: Vec<String>,
    pub glosses: Vec<String>,
    pub literal: String,
}

impl FlexWord {
    fn from_node(word: Node<'_, '_>) -> Self {
        let name = word
            .children()
            .filter(|child| child.has_tag_name("words"))
            .flat_map(|words| words.children().filter(|child| child.has_tag_name("word")))
            .flat_map(|inner| inner.children().filter(|child| child.has_tag_name("item")))
            .map(|item| item.text().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");
        let literal = word
            .descendants()
            .find(|node| is_item_of_type(*node, "lit"))
            .and_then(|node| node.text())
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            morphs: morph_items(word, "txt"),
            glosses: morph_items(word, "gls"),
            literal,
        }
    }

    pub fn payload_events(&self) -> Vec<MarkupEvent> {
        let mut events = vec![
            MarkupEvent::open("table"),
            MarkupEvent::open("caption"),
            MarkupEvent::text(self.name.clone()),
            MarkupEvent::close("caption"),
        ];
        let has_rows = self.morphs.iter().any(|morph| !morph.is_empty())
            && self.glosses.iter().any(|gloss| !gloss.is_empty());
        if has_rows {
            push_row(&mut events, &self.morphs);
            push_row(&mut events, &self.glosses);
        }
        let colspan = self.morphs.len().to_string();
        events.extend([
            MarkupEvent::open("tr"),
            MarkupEvent::open_with("td", &[("colspan", colspan.as_str())]),
            MarkupEvent::text(format!("'{}'", self.literal)),
            MarkupEvent::close("td"),
            MarkupEvent::close("tr"),
            MarkupEvent::close("table"),
        ]);
        events
    }

    pub fn to_record(&self) -> Result<AnnotationRecord, SerializationError> {
        let payload = serialize(&self.payload_events(), &SerializeOptions::default())?;
        Ok(AnnotationRecord::keyed(self.name.clone(), payload))
    }
}

/// Reads every analysed word of a FLEx export, in text order.
pub fn read_flex_words(source: &str) -> Result<Vec<FlexWord>, FlexError> {
    let document = roxmltree::Document::parse(source)?;
    let mut words = Vec::new();
    for text in document
        .root_element()
        .children()
        .filter(|child| child.has_tag_name("interlinear-text"))
    {
        let before = words.len();
        for phrases in text.descendants().filter(|node| node.has_tag_name("phrases")) {
            words.extend(
                phrases
                    .children()
                    .filter(|child| child.has_tag_name("word"))
                    .map(FlexWord::from_node),
            );
        }
        debug!(
            title = text_title(text).unwrap_or_default(),
            words = words.len() - before,
            "read FLEx interlinear text"
        );
    }
    Ok(words)
}

/// Converts a FLEx export into an ordered annotation record list.
pub fn import_flex(source: &str) -> Result<Vec<AnnotationRecord>, FlexError> {
    read_flex_words(source)?
        .iter()
        .map(|word| word.to_record().map_err(FlexError::from))
        .collect()
}

fn text_title<'a>(text: Node<'a, '_>) -> Option<&'a str> {
    text.descendants()
        .find(|node| is_item_of_type(*node, "title-abbreviation"))
        .and_then(|node| node.text())
}

fn is_item_of_type(node: Node<'_, '_>, kind: &str) -> bool {
    node.has_tag_name("item") && node.attribute("type") == Some(kind)
}

fn morph_items(word: Node<'_, '_>, kind: &str) -> Vec<String> {
    word.descendants()
        .filter(|node| node.has_tag_name("morph"))
        .flat_map(|morph| morph.children().filter(|child| is_item_of_type(*child, kind)))
        .map(|item| item.text().unwrap_or_default().to_string())
        .collect()
}

fn push_row(events: &mut Vec<MarkupEvent>, cells: &[String]) {
    events.push(MarkupEvent::open("tr"));
    for cell in cells {
        events.push(MarkupEvent::open("td"));
        events.push(MarkupEvent::text(cell.clone()));
        events.push(MarkupEvent::close("td"));
    }
    events.push(MarkupEvent::close("tr"));
}
