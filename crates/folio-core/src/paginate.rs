use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::event::{BreakKind, BreakMarker, Element, MarkupEvent};
use crate::stack::{Position, StructuralError, TagStack};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Root element enclosing every page container.
    pub wrapper: String,
    /// Element used for page and column containers.
    pub container: String,
    /// Extra class put on every page container.
    pub text_name: String,
    pub column_class: String,
    /// Class of the full-width container a column marker with an empty `n`
    /// opens, ending a run of columns.
    pub full_width_class: String,
    /// Element counted as a line break when reporting positions.
    pub line_break: String,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            wrapper: "div".to_string(),
            container: "div".to_string(),
            text_name: String::new(),
            column_class: "col-xs-6".to_string(),
            full_width_class: "col-xs-12".to_string(),
            line_break: "br".to_string(),
        }
    }
}

/// Regroups flat break markers into nested page and column containers.
pub fn paginate<I>(
    events: I,
    options: &PaginationOptions,
) -> Result<Vec<MarkupEvent>, StructuralError>
where
    I: IntoIterator<Item = MarkupEvent>,
{
    let mut paginator = Paginator::new(options);
    let mut out = Vec::new();
    for event in events {
        paginator.feed(event, &mut out)?;
    }
    paginator.finish(&mut out)?;
    Ok(out)
}

/// Incremental form of [`paginate`]: feed events one at a time and collect
/// the output in a caller-owned buffer.
pub struct Paginator<'a> {
    options: &'a PaginationOptions,
    stack: TagStack,
    started: bool,
    index: usize,
    page: usize,
    // Last column number used on the current page.
    column: usize,
    // A column or full-width container is open inside the page container.
    column_open: bool,
    columns_total: usize,
    line: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(options: &'a PaginationOptions) -> Self {
        Self {
            options,
            stack: TagStack::new(),
            started: false,
            index: 0,
            page: 1,
            column: 0,
            column_open: false,
            columns_total: 0,
            line: 1,
        }
    }

    pub fn feed(
        &mut self,
        event: MarkupEvent,
        out: &mut Vec<MarkupEvent>,
    ) -> Result<(), StructuralError> {
        self.begin(out);
        let at = self.position();
        match event {
            MarkupEvent::Open(element) => {
                if element.name == self.options.line_break {
                    self.line += 1;
                }
                self.stack.push(element.clone());
                out.push(MarkupEvent::Open(element));
            }
            MarkupEvent::Close(name) => {
                self.stack.pop(&name, at)?;
                out.push(MarkupEvent::Close(name));
            }
            MarkupEvent::Break(marker) => self.handle_break(marker, out),
            event @ (MarkupEvent::Text(_) | MarkupEvent::Raw(_)) => out.push(event),
        }
        self.index += 1;
        Ok(())
    }

    pub fn finish(mut self, out: &mut Vec<MarkupEvent>) -> Result<(), StructuralError> {
        self.begin(out);
        if !self.stack.is_empty() {
            return Err(StructuralError::Unclosed {
                open: self.stack.names(),
                at: self.position(),
            });
        }
        if self.column_open {
            out.push(MarkupEvent::Close(self.options.container.clone()));
        }
        out.push(MarkupEvent::Close(self.options.container.clone()));
        out.push(MarkupEvent::Close(self.options.wrapper.clone()));
        info!(
            pages = self.page,
            columns = self.columns_total,
            events = self.index,
            "pagination finished"
        );
        Ok(())
    }

    pub fn position(&self) -> Position {
        Position {
            index: self.index,
            page: self.page,
            line: self.line,
        }
    }

    fn begin(&mut self, out: &mut Vec<MarkupEvent>) {
        if self.started {
            return;
        }
        self.started = true;
        out.push(MarkupEvent::Open(Element::new(self.options.wrapper.clone())));
        out.push(MarkupEvent::Open(self.page_container("0")));
    }

    fn handle_break(&mut self, marker: BreakMarker, out: &mut Vec<MarkupEvent>) {
        self.close_all(out);
        if self.column_open {
            out.push(MarkupEvent::Close(self.options.container.clone()));
            self.column_open = false;
        }
        match marker.kind {
            BreakKind::Page => {
                out.push(MarkupEvent::Close(self.options.container.clone()));
                self.page += 1;
                self.column = 0;
                self.line = 1;
                let recto_verso = marker.attr("n").unwrap_or_default();
                out.push(MarkupEvent::Open(self.page_container(recto_verso)));
                debug!(page = self.page, recto_verso, "opened page container");
            }
            // `n=""` ends a run of columns, `n="1"` starts a new one.
            BreakKind::Column if marker.attr("n") == Some("") => {
                self.column = 0;
                self.column_open = true;
                out.push(MarkupEvent::Open(
                    Element::new(self.options.container.clone())
                        .with_attr("class", self.options.full_width_class.clone()),
                ));
                debug!(page = self.page, "opened full-width container");
            }
            BreakKind::Column => {
                self.column = match marker.attr("n") {
                    Some("1") => 1,
                    _ => self.column + 1,
                };
                self.column_open = true;
                self.columns_total += 1;
                out.push(MarkupEvent::Open(self.column_container()));
                debug!(page = self.page, column = self.column, "opened column container");
            }
        }
        self.reopen_all(out);
    }

    fn close_all(&self, out: &mut Vec<MarkupEvent>) {
        for frame in self.stack.frames().iter().rev() {
            out.push(MarkupEvent::Close(frame.name.clone()));
        }
    }

    fn reopen_all(&self, out: &mut Vec<MarkupEvent>) {
        for frame in self.stack.frames() {
            let mut reopened = frame.clone();
            reopened.continued = true;
            out.push(MarkupEvent::Open(reopened));
        }
    }

    fn page_container(&self, recto_verso: &str) -> Element {
        let class = if self.options.text_name.is_empty() {
            "printed-text-page".to_string()
        } else {
            format!("printed-text-page {}", self.options.text_name)
        };
        Element::new(self.options.container.clone())
            .with_attr("class", class)
            .with_attr("data-n", self.page.to_string())
            .with_attr("data-rvn", recto_verso)
    }

    fn column_container(&self) -> Element {
        Element::new(self.options.container.clone())
            .with_attr("class", self.options.column_class.clone())
            .with_attr("data-n", self.column.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{PaginationOptions, paginate};
    use crate::event::{BreakKind, BreakMarker, MarkupEvent};
    use crate::stack::{Position, StructuralError};

    fn page(n: usize, rvn: &str) -> MarkupEvent {
        MarkupEvent::open_with(
            "div",
            &[
                ("class", "printed-text-page"),
                ("data-n", n.to_string().as_str()),
                ("data-rvn", rvn),
            ],
        )
    }

    fn column(n: usize) -> MarkupEvent {
        MarkupEvent::open_with(
            "div",
            &[("class", "col-xs-6"), ("data-n", n.to_string().as_str())],
        )
    }

    fn reopened(name: &str) -> MarkupEvent {
        let MarkupEvent::Open(mut element) = MarkupEvent::open(name) else {
            unreachable!()
        };
        element.continued = true;
        MarkupEvent::Open(element)
    }

    #[test]
    fn page_break_closes_and_reopens_ancestors() {
        let input = vec![
            MarkupEvent::open("div"),
            MarkupEvent::text("a"),
            MarkupEvent::page_break(),
            MarkupEvent::text("b"),
            MarkupEvent::close("div"),
        ];
        let output = paginate(input, &PaginationOptions::default()).expect("paginate");
        let expected = vec![
            MarkupEvent::open("div"),
            page(1, "0"),
            MarkupEvent::open("div"),
            MarkupEvent::text("a"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
            page(2, ""),
            reopened("div"),
            MarkupEvent::text("b"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
        ];
        assert_eq!(output, expected);
    }

    #[test]
    fn recto_verso_number_comes_from_marker() {
        let marker = BreakMarker::new(BreakKind::Page).with_attr("n", "2v");
        let output = paginate(
            vec![MarkupEvent::Break(marker)],
            &PaginationOptions::default(),
        )
        .expect("paginate");
        assert!(output.contains(&page(2, "2v")));
    }

    #[test]
    fn leading_break_leaves_empty_initial_container() {
        let input = vec![
            MarkupEvent::page_break(),
            MarkupEvent::open("p"),
            MarkupEvent::close("p"),
        ];
        let output = paginate(input, &PaginationOptions::default()).expect("paginate");
        assert_eq!(
            &output[..4],
            &[
                MarkupEvent::open("div"),
                page(1, "0"),
                MarkupEvent::close("div"),
                page(2, ""),
            ]
        );
    }

    #[test]
    fn consecutive_breaks_are_not_coalesced() {
        let input = vec![MarkupEvent::page_break(), MarkupEvent::page_break()];
        let output = paginate(input, &PaginationOptions::default()).expect("paginate");
        let pages = output
            .iter()
            .filter(|event| matches!(event, MarkupEvent::Open(el) if el.attr("data-rvn").is_some()))
            .count();
        assert_eq!(pages, 3);
    }

    #[test]
    fn column_counter_resets_per_page() {
        let input = vec![
            MarkupEvent::open("p"),
            MarkupEvent::column_break(),
            MarkupEvent::text("left"),
            MarkupEvent::column_break(),
            MarkupEvent::text("right"),
            MarkupEvent::page_break(),
            MarkupEvent::column_break(),
            MarkupEvent::close("p"),
        ];
        let output = paginate(input, &PaginationOptions::default()).expect("paginate");
        let expected = vec![
            MarkupEvent::open("div"),
            page(1, "0"),
            MarkupEvent::open("p"),
            MarkupEvent::close("p"),
            column(1),
            reopened("p"),
            MarkupEvent::text("left"),
            MarkupEvent::close("p"),
            MarkupEvent::close("div"),
            column(2),
            reopened("p"),
            MarkupEvent::text("right"),
            MarkupEvent::close("p"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
            page(2, ""),
            reopened("p"),
            MarkupEvent::close("p"),
            column(1),
            reopened("p"),
            MarkupEvent::close("p"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
        ];
        assert_eq!(output, expected);
    }

    #[test]
    fn text_name_is_added_to_page_class() {
        let options = PaginationOptions {
            text_name: "arte".to_string(),
            ..Default::default()
        };
        let output = paginate(Vec::new(), &options).expect("paginate");
        let MarkupEvent::Open(container) = &output[1] else {
            panic!("expected page container");
        };
        assert_eq!(container.attr("class"), Some("printed-text-page arte"));
    }

    #[test]
    fn mismatched_close_reports_page_and_line() {
        let input = vec![
            MarkupEvent::page_break(),
            MarkupEvent::open("p"),
            MarkupEvent::open("br"),
            MarkupEvent::close("br"),
            MarkupEvent::close("em"),
        ];
        let err = paginate(input, &PaginationOptions::default()).unwrap_err();
        assert_eq!(
            err,
            StructuralError::Mismatch {
                expected: "p".to_string(),
                found: "em".to_string(),
                at: Position {
                    index: 4,
                    page: 2,
                    line: 2
                },
            }
        );
    }

    #[test]
    fn unclosed_elements_fail_at_end() {
        let input = vec![MarkupEvent::open("div"), MarkupEvent::open("p")];
        let err = paginate(input, &PaginationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            StructuralError::Unclosed { ref open, .. } if open == &["div".to_string(), "p".to_string()]
        ));
    }

    #[test]
    fn empty_column_number_opens_full_width_container() {
        let input = vec![
            MarkupEvent::open("p"),
            MarkupEvent::text("intro"),
            MarkupEvent::close("p"),
            MarkupEvent::Break(BreakMarker::new(BreakKind::Column).with_attr("n", "1")),
            MarkupEvent::text("left"),
            MarkupEvent::Break(BreakMarker::new(BreakKind::Column).with_attr("n", "2")),
            MarkupEvent::text("right"),
            MarkupEvent::Break(BreakMarker::new(BreakKind::Column).with_attr("n", "")),
            MarkupEvent::open("p"),
            MarkupEvent::text("full width"),
            MarkupEvent::close("p"),
            MarkupEvent::Break(BreakMarker::new(BreakKind::Column).with_attr("n", "1")),
            MarkupEvent::text("again"),
        ];
        let output = paginate(input, &PaginationOptions::default()).expect("paginate");
        let expected = vec![
            MarkupEvent::open("div"),
            page(1, "0"),
            MarkupEvent::open("p"),
            MarkupEvent::text("intro"),
            MarkupEvent::close("p"),
            column(1),
            MarkupEvent::text("left"),
            MarkupEvent::close("div"),
            column(2),
            MarkupEvent::text("right"),
            MarkupEvent::close("div"),
            MarkupEvent::open_with("div", &[("class", "col-xs-12")]),
            MarkupEvent::open("p"),
            MarkupEvent::text("full width"),
            MarkupEvent::close("p"),
            MarkupEvent::close("div"),
            column(1),
            MarkupEvent::text("again"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
            MarkupEvent::close("div"),
        ];
        assert_eq!(output, expected);
    }
}
