use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::event::Element;

/// Where an input event sits: its index in the event stream plus the page
/// and line it fell on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Position {
    pub index: usize,
    pub page: usize,
    pub line: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {} (page {}, line {})",
            self.index, self.page, self.line
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StructuralError {
    #[error("tried to close <{name}>, but no tags have been opened, at {at}")]
    Underflow { name: String, at: Position },
    #[error("tried to close <{found}>, but last opened tag was <{expected}>, at {at}")]
    Mismatch {
        expected: String,
        found: String,
        at: Position,
    },
    #[error("document ended with unclosed elements <{}>, at {at}", open.join("> <"))]
    Unclosed { open: Vec<String>, at: Position },
}

/// The currently open elements, outermost first.
#[derive(Clone, Debug, Default)]
pub struct TagStack {
    frames: Vec<Element>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Element) {
        self.frames.push(frame);
    }

    /// Pops the innermost frame, which must be the element named `closing`.
    pub fn pop(&mut self, closing: &str, at: Position) -> Result<Element, StructuralError> {
        match self.frames.pop() {
            None => Err(StructuralError::Underflow {
                name: closing.to_string(),
                at,
            }),
            Some(top) if top.name != closing => {
                let expected = top.name.clone();
                self.frames.push(top);
                Err(StructuralError::Mismatch {
                    expected,
                    found: closing.to_string(),
                    at,
                })
            }
            Some(top) => Ok(top),
        }
    }

    pub fn snapshot(&self) -> Vec<Element> {
        self.frames.clone()
    }

    pub fn frames(&self) -> &[Element] {
        &self.frames
    }

    pub fn top(&self) -> Option<&Element> {
        self.frames.last()
    }

    pub fn names(&self) -> Vec<String> {
        self.frames.iter().map(|frame| frame.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Position, StructuralError, TagStack};
    use crate::event::Element;

    #[test]
    fn pop_returns_innermost_frame() {
        let mut stack = TagStack::new();
        stack.push(Element::new("div"));
        stack.push(Element::new("p").with_attr("class", "x"));

        let frame = stack.pop("p", Position::default()).expect("pop p");
        assert_eq!(frame.attr("class"), Some("x"));
        assert_eq!(stack.names(), vec!["div".to_string()]);
    }

    #[test]
    fn pop_on_empty_stack_is_underflow() {
        let mut stack = TagStack::new();
        let at = Position {
            index: 4,
            page: 2,
            line: 3,
        };
        let err = stack.pop("p", at).unwrap_err();
        assert_eq!(
            err,
            StructuralError::Underflow {
                name: "p".to_string(),
                at
            }
        );
        assert!(err.to_string().contains("page 2, line 3"));
    }

    #[test]
    fn pop_with_wrong_name_names_both_tags() {
        let mut stack = TagStack::new();
        stack.push(Element::new("em"));
        let err = stack.pop("p", Position::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tried to close <p>, but last opened tag was <em>, at event 0 (page 0, line 0)"
        );
        // The offending frame stays put.
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn snapshot_is_outermost_first() {
        let mut stack = TagStack::new();
        stack.push(Element::new("div"));
        stack.push(Element::new("ul"));
        stack.push(Element::new("li"));
        let names: Vec<_> = stack.snapshot().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["div", "ul", "li"]);
        assert_eq!(stack.top().map(|f| f.name.as_str()), Some("li"));
    }
}
