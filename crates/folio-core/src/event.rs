use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An open element as it travels through the pipeline.
///
/// `annotatable` is set by the event source on elements that wrap a word
/// eligible for an annotation. `continued` is set only by the paginator on
/// elements it re-opens after a page or column break.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub annotatable: bool,
    pub continued: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            annotatable: false,
            continued: false,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn mark_annotatable(mut self) -> Self {
        self.annotatable = true;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attributes, name)
    }

    /// Same name and attributes, ignoring the pipeline flags.
    pub fn same_markup(&self, other: &Element) -> bool {
        self.name == other.name && self.attributes == other.attributes
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BreakKind {
    Page,
    Column,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakMarker {
    pub kind: BreakKind,
    pub attributes: Vec<Attribute>,
}

impl BreakMarker {
    pub fn new(kind: BreakKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attributes, name)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MarkupEvent {
    Open(Element),
    Close(String),
    Text(String),
    Break(BreakMarker),
    /// Already-rendered markup, written verbatim.
    Raw(String),
}

impl MarkupEvent {
    pub fn open(name: impl Into<String>) -> Self {
        MarkupEvent::Open(Element::new(name))
    }

    pub fn open_with(name: impl Into<String>, attributes: &[(&str, &str)]) -> Self {
        let mut element = Element::new(name);
        for (key, value) in attributes {
            element.attributes.push(Attribute::new(*key, *value));
        }
        MarkupEvent::Open(element)
    }

    pub fn close(name: impl Into<String>) -> Self {
        MarkupEvent::Close(name.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        MarkupEvent::Text(text.into())
    }

    pub fn page_break() -> Self {
        MarkupEvent::Break(BreakMarker::new(BreakKind::Page))
    }

    pub fn column_break() -> Self {
        MarkupEvent::Break(BreakMarker::new(BreakKind::Column))
    }
}

fn find_attr<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}
