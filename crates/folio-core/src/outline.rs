//! Table of contents for a transcription.
//!
//! Sections are divisions whose id is the text name followed by a dotted
//! section number (`arte1.2`). A heading with `type="outline"` inside a
//! section gives its title, and the page is the number of page breaks seen
//! before the division opened. The result is a nested list:
//!
//! ```text
//! <div class="index"><ul>
//!   <li><a href="...">1 Title</a><ul id="section1">
//!     <li><a href="...">1.1 Title</a></li>
//!   </ul></li>
//! </ul></div>
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::convert::{ConvertError, ConvertOptions};
use crate::event::{BreakKind, Element, MarkupEvent};
use crate::serialize::serialize;
use crate::source::read_events;

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutlineOptions {
    /// Element whose id carries a section number.
    pub section: String,
    pub heading: String,
    /// `type` a heading needs to count as the section title.
    pub heading_type: String,
    /// Link target of every entry; `{text}` and `{page}` are substituted.
    pub url_template: String,
    /// Page number before the first page break.
    pub first_page: usize,
    pub class: String,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            section: "div".to_string(),
            heading: "head".to_string(),
            heading_type: "outline".to_string(),
            url_template: "https://ticha.haverford.edu/en/texts/{text}/{page}/original"
                .to_string(),
            first_page: 0,
            class: "index".to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutlineSection {
    pub number: Vec<String>,
    pub title: String,
    pub page: usize,
}

/// Collects numbered sections in document order.
pub fn collect_sections<I>(events: I, text_name: &str, options: &OutlineOptions) -> Vec<OutlineSection>
where
    I: IntoIterator<Item = MarkupEvent>,
{
    let mut sections: Vec<OutlineSection> = Vec::new();
    let mut page = options.first_page;
    let mut depth = 0usize;
    // Depth of the title heading being read, if any.
    let mut heading: Option<usize> = None;

    for event in events {
        match event {
            MarkupEvent::Open(element) => {
                if element.name == options.section {
                    if let Some(number) = section_number(&element, text_name) {
                        sections.push(OutlineSection {
                            number,
                            title: String::new(),
                            page,
                        });
                    }
                } else if heading.is_none()
                    && element.name == options.heading
                    && element.attr("type") == Some(options.heading_type.as_str())
                {
                    if sections.is_empty() {
                        debug!("outline heading before the first section ignored");
                    } else {
                        heading = Some(depth);
                    }
                }
                depth += 1;
            }
            MarkupEvent::Close(_) => {
                depth = depth.saturating_sub(1);
                if heading == Some(depth) {
                    heading = None;
                }
            }
            MarkupEvent::Text(text) => {
                if heading.is_some() {
                    if let Some(section) = sections.last_mut() {
                        section.title.push_str(&text);
                    }
                }
            }
            MarkupEvent::Break(marker) if marker.kind == BreakKind::Page => page += 1,
            MarkupEvent::Break(_) | MarkupEvent::Raw(_) => {}
        }
    }

    for section in &mut sections {
        section.title = section.title.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    sections
}

fn section_number(element: &Element, text_name: &str) -> Option<Vec<String>> {
    let id = element
        .attributes
        .iter()
        .find(|attr| attr.name == "id" || attr.name.ends_with(":id"))?;
    let number = id.value.strip_prefix(text_name)?;
    if number.is_empty() {
        debug!(id = %id.value, "section id without a number");
        return None;
    }
    Some(number.split('.').map(str::to_string).collect())
}

/// Lays the sections out as nested lists, one level per number component.
/// Missing intermediate levels get an unlinked entry holding the number
/// prefix.
pub fn outline_events(
    sections: &[OutlineSection],
    text_name: &str,
    options: &OutlineOptions,
) -> Vec<MarkupEvent> {
    let mut out = vec![
        MarkupEvent::open_with("div", &[("class", options.class.as_str())]),
        MarkupEvent::open("ul"),
    ];
    let mut depth = 1;
    // Whether the innermost list has an entry still open.
    let mut item_open = false;

    for section in sections {
        let level = section.number.len().max(1);
        while depth > level {
            if item_open {
                out.push(MarkupEvent::close("li"));
            }
            out.push(MarkupEvent::close("ul"));
            depth -= 1;
            item_open = true;
        }
        while depth < level {
            let prefix = section.number[..depth].join(".");
            if !item_open {
                out.push(MarkupEvent::open("li"));
                out.push(MarkupEvent::text(prefix.clone()));
            }
            let id = format!("section{}", prefix);
            out.push(MarkupEvent::open_with("ul", &[("id", id.as_str())]));
            depth += 1;
            item_open = false;
        }
        if item_open {
            out.push(MarkupEvent::close("li"));
        }

        let href = options
            .url_template
            .replace("{text}", text_name)
            .replace("{page}", &section.page.to_string());
        let number = section.number.join(".");
        let label = if section.title.is_empty() {
            number
        } else {
            format!("{} {}", number, section.title)
        };
        out.push(MarkupEvent::open("li"));
        out.push(MarkupEvent::open_with("a", &[("href", href.as_str())]));
        out.push(MarkupEvent::text(label));
        out.push(MarkupEvent::close("a"));
        item_open = true;
    }

    while depth > 0 {
        if item_open {
            out.push(MarkupEvent::close("li"));
        }
        out.push(MarkupEvent::close("ul"));
        depth -= 1;
        item_open = true;
    }
    out.push(MarkupEvent::close("div"));
    out
}

/// Reads a tag-mapped document and renders its table of contents. The
/// section ids are matched against `pagination.text_name`.
pub fn outline(source: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    let text_name = options.pagination.text_name.as_str();
    let events = read_events(source, &options.recognizer)?;
    let sections = collect_sections(events, text_name, &options.outline);
    info!(sections = sections.len(), text = text_name, "outline collected");
    let events = outline_events(&sections, text_name, &options.outline);
    Ok(serialize(&events, &options.serialize)?)
}
