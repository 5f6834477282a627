use std::collections::HashSet;

use ammonia::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Element, MarkupEvent};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SerializationError {
    #[error("invalid element name {name:?} at event {index}")]
    InvalidName { name: String, index: usize },
    #[error("invalid attribute name {name:?} on <{element}> at event {index}")]
    InvalidAttributeName {
        element: String,
        name: String,
        index: usize,
    },
    #[error("character U+{code:04X} cannot be written as markup at event {index}")]
    UnrepresentableChar { code: u32, index: usize },
    #[error("void element <{name}> has content at event {index}")]
    VoidContent { name: String, index: usize },
    #[error("unexpected </{name}> at event {index}")]
    UnexpectedClose { name: String, index: usize },
    #[error("unresolved break marker at event {index}")]
    UnresolvedBreak { index: usize },
    #[error("output ended with unclosed elements <{}>", open.join("> <"))]
    Unclosed { open: Vec<String> },
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Elements written in self-closing form; they may not have content.
    pub void_elements: Vec<String>,
    /// Run every raw payload fragment through the HTML sanitizer.
    pub sanitize_payloads: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        let void_elements = [
            "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
            "track", "wbr",
        ];
        Self {
            void_elements: void_elements.iter().map(|name| name.to_string()).collect(),
            sanitize_payloads: false,
        }
    }
}

/// Renders an event sequence to markup text in one linear pass.
pub fn serialize(
    events: &[MarkupEvent],
    options: &SerializeOptions,
) -> Result<String, SerializationError> {
    let void: HashSet<&str> = options.void_elements.iter().map(String::as_str).collect();
    let sanitizer = options.sanitize_payloads.then(|| {
        let mut builder = Builder::default();
        builder.add_generic_attributes(["class"]);
        builder
    });

    let mut out = String::new();
    let mut open: Vec<&str> = Vec::new();
    let mut iter = events.iter().enumerate().peekable();
    while let Some((index, event)) = iter.next() {
        match event {
            MarkupEvent::Open(element) => {
                write_start_tag(&mut out, element, index)?;
                if void.contains(element.name.as_str()) {
                    let closes_here = matches!(
                        iter.peek(),
                        Some((_, MarkupEvent::Close(name))) if *name == element.name
                    );
                    if closes_here {
                        iter.next();
                        out.push_str("/>");
                    } else if let Some((next, _)) = iter.peek() {
                        return Err(SerializationError::VoidContent {
                            name: element.name.clone(),
                            index: *next,
                        });
                    } else {
                        let mut names: Vec<String> =
                            open.iter().map(|name| name.to_string()).collect();
                        names.push(element.name.clone());
                        return Err(SerializationError::Unclosed { open: names });
                    }
                } else {
                    out.push('>');
                    open.push(&element.name);
                }
            }
            MarkupEvent::Close(name) => {
                if open.last() != Some(&name.as_str()) {
                    return Err(SerializationError::UnexpectedClose {
                        name: name.clone(),
                        index,
                    });
                }
                open.pop();
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            MarkupEvent::Text(text) => escape_text(&mut out, text, index)?,
            MarkupEvent::Raw(fragment) => {
                if let Some(sanitizer) = &sanitizer {
                    let clean = sanitizer.clean(fragment).to_string();
                    check_chars(&clean, index)?;
                    out.push_str(&clean);
                } else {
                    check_chars(fragment, index)?;
                    out.push_str(fragment);
                }
            }
            MarkupEvent::Break(_) => return Err(SerializationError::UnresolvedBreak { index }),
        }
    }

    if !open.is_empty() {
        return Err(SerializationError::Unclosed {
            open: open.iter().map(|name| name.to_string()).collect(),
        });
    }
    Ok(out)
}

fn write_start_tag(
    out: &mut String,
    element: &Element,
    index: usize,
) -> Result<(), SerializationError> {
    if !is_valid_name(&element.name) {
        return Err(SerializationError::InvalidName {
            name: element.name.clone(),
            index,
        });
    }
    out.push('<');
    out.push_str(&element.name);
    for attr in &element.attributes {
        if !is_valid_name(&attr.name) {
            return Err(SerializationError::InvalidAttributeName {
                element: element.name.clone(),
                name: attr.name.clone(),
                index,
            });
        }
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_attr(out, &attr.value, index)?;
        out.push('"');
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
}

fn is_representable(ch: char) -> bool {
    !matches!(ch, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

fn check_chars(text: &str, index: usize) -> Result<(), SerializationError> {
    match text.chars().find(|ch| !is_representable(*ch)) {
        Some(ch) => Err(SerializationError::UnrepresentableChar {
            code: ch as u32,
            index,
        }),
        None => Ok(()),
    }
}

fn escape_text(out: &mut String, text: &str, index: usize) -> Result<(), SerializationError> {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            // A reader would fold a literal CR into LF.
            '\r' => out.push_str("&#13;"),
            _ if !is_representable(ch) => {
                return Err(SerializationError::UnrepresentableChar {
                    code: ch as u32,
                    index,
                });
            }
            _ => out.push(ch),
        }
    }
    Ok(())
}

fn escape_attr(out: &mut String, text: &str, index: usize) -> Result<(), SerializationError> {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // Attribute-value normalization turns these into spaces.
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ if !is_representable(ch) => {
                return Err(SerializationError::UnrepresentableChar {
                    code: ch as u32,
                    index,
                });
            }
            _ => out.push(ch),
        }
    }
    Ok(())
}
