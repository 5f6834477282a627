use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, W_KEY_MISMATCH, W_RECORDS_UNUSED, W_SPANS_UNMATCHED};
use crate::event::{Element, MarkupEvent};
use crate::normalize::normalize_word;

/// One externally authored annotation. Records pair with annotatable spans
/// purely by position in the list; `key` is only checked, never joined on.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct AnnotationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub payload: String,
}

impl AnnotationRecord {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            key: None,
            payload: payload.into(),
        }
    }

    pub fn keyed(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            payload: payload.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct ElementSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl ElementSpec {
    pub fn new(name: impl Into<String>, class: Option<&str>) -> Self {
        Self {
            name: name.into(),
            class: class.map(str::to_string),
        }
    }

    fn to_element(&self) -> Element {
        let element = Element::new(self.name.clone());
        match &self.class {
            Some(class) => element.with_attr("class", class.clone()),
            None => element,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotationOptions {
    /// Opened right before a matched span and closed after its payload.
    pub wrapper: Option<ElementSpec>,
    /// Encloses the payload fragment, right after the span closes.
    pub payload: ElementSpec,
    pub check_keys: bool,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            wrapper: Some(ElementSpec::new("span", Some("popover-markup inline"))),
            payload: ElementSpec::new("span", Some("content hide inline")),
            check_keys: true,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub spans_consumed: usize,
    pub records_consumed: usize,
    pub unmatched_spans: usize,
    pub unmatched_records: usize,
    /// Annotatable elements that never held text; they take no record.
    pub empty_spans: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl MatchReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Annotated {
    pub events: Vec<MarkupEvent>,
    pub report: MatchReport,
}

/// Pairs the kth annotatable span with the kth record and splices the
/// record's payload in right after the span. Only elements holding text
/// count as spans.
pub fn annotate<I>(events: I, records: &[AnnotationRecord], options: &AnnotationOptions) -> Annotated
where
    I: IntoIterator<Item = MarkupEvent>,
{
    let mut matcher = Matcher::new(records, options);
    let mut out = Vec::new();
    for event in events {
        matcher.feed(event, &mut out);
    }
    let report = matcher.finish();
    Annotated { events: out, report }
}

struct OpenSpan {
    depth: usize,
    // Where this fragment's opening tag sits in the output, so a wrapper can
    // still be placed in front of it once the span turns out to have text.
    start: usize,
}

enum SpanState {
    // No text seen yet; an element that stays empty takes no record.
    Pending,
    Counted {
        index: usize,
        record: Option<usize>,
        payload_placed: bool,
    },
}

// The most recent span; its key check waits until no more fragments can
// follow.
struct CurrentSpan {
    state: SpanState,
    text: String,
}

struct Matcher<'a> {
    records: &'a [AnnotationRecord],
    options: &'a AnnotationOptions,
    cursor: usize,
    depth: usize,
    open: Option<OpenSpan>,
    current: Option<CurrentSpan>,
    report: MatchReport,
}

impl<'a> Matcher<'a> {
    fn new(records: &'a [AnnotationRecord], options: &'a AnnotationOptions) -> Self {
        Self {
            records,
            options,
            cursor: 0,
            depth: 0,
            open: None,
            current: None,
            report: MatchReport::default(),
        }
    }

    fn feed(&mut self, event: MarkupEvent, out: &mut Vec<MarkupEvent>) {
        match event {
            MarkupEvent::Open(element) => {
                if self.open.is_none() && element.annotatable {
                    self.start_fragment(&element, out.len());
                }
                self.depth += 1;
                out.push(MarkupEvent::Open(element));
            }
            MarkupEvent::Close(name) => {
                self.depth = self.depth.saturating_sub(1);
                out.push(MarkupEvent::Close(name));
                if self.open.as_ref().is_some_and(|span| span.depth == self.depth) {
                    self.open = None;
                    self.place_payload(out);
                }
            }
            MarkupEvent::Text(text) => {
                if let Some(start) = self.open.as_ref().map(|span| span.start) {
                    if !text.is_empty() {
                        self.count_span(start, out);
                    }
                    if let Some(current) = self.current.as_mut() {
                        current.text.push_str(&text);
                    }
                }
                out.push(MarkupEvent::Text(text));
            }
            event @ (MarkupEvent::Break(_) | MarkupEvent::Raw(_)) => out.push(event),
        }
    }

    fn start_fragment(&mut self, element: &Element, start: usize) {
        self.open = Some(OpenSpan {
            depth: self.depth,
            start,
        });
        if element.continued && self.current.is_some() {
            return;
        }
        self.check_current();
        self.current = Some(CurrentSpan {
            state: SpanState::Pending,
            text: String::new(),
        });
    }

    /// Assigns the next record to a span on its first non-empty text.
    fn count_span(&mut self, start: usize, out: &mut Vec<MarkupEvent>) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if !matches!(current.state, SpanState::Pending) {
            return;
        }
        let index = self.report.spans_consumed;
        self.report.spans_consumed += 1;
        let record = if self.cursor < self.records.len() {
            self.cursor += 1;
            self.report.records_consumed += 1;
            Some(self.cursor - 1)
        } else {
            self.report.unmatched_spans += 1;
            None
        };
        current.state = SpanState::Counted {
            index,
            record,
            payload_placed: false,
        };
        if record.is_some() {
            if let Some(wrapper) = &self.options.wrapper {
                out.insert(start, MarkupEvent::Open(wrapper.to_element()));
            }
        }
    }

    fn place_payload(&mut self, out: &mut Vec<MarkupEvent>) {
        let Some(CurrentSpan {
            state:
                SpanState::Counted {
                    record: Some(record_index),
                    payload_placed,
                    ..
                },
            ..
        }) = self.current.as_mut()
        else {
            return;
        };
        if *payload_placed {
            return;
        }
        *payload_placed = true;
        let Some(record) = self.records.get(*record_index) else {
            return;
        };
        out.push(MarkupEvent::Open(self.options.payload.to_element()));
        out.push(MarkupEvent::Raw(record.payload.clone()));
        out.push(MarkupEvent::Close(self.options.payload.name.clone()));
        if let Some(wrapper) = &self.options.wrapper {
            out.push(MarkupEvent::Close(wrapper.name.clone()));
        }
    }

    fn check_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let (index, record) = match current.state {
            SpanState::Pending => {
                self.report.empty_spans += 1;
                debug!("annotatable element without text skipped");
                return;
            }
            SpanState::Counted { index, record, .. } => (index, record),
        };
        if !self.options.check_keys {
            return;
        }
        let Some(record_index) = record else {
            return;
        };
        let Some(key) = self.records[record_index].key.as_deref() else {
            return;
        };
        if normalize_word(key) != normalize_word(&current.text) {
            let diagnostic = Diagnostic::new(
                W_KEY_MISMATCH,
                format!(
                    "annotation key {:?} does not match span text {:?}",
                    key, current.text
                ),
            )
            .at_span(index)
            .at_record(record_index);
            self.record(diagnostic);
        }
    }

    fn finish(mut self) -> MatchReport {
        self.check_current();
        if self.report.unmatched_spans > 0 {
            let first = self.report.spans_consumed - self.report.unmatched_spans;
            let diagnostic = Diagnostic::new(
                W_SPANS_UNMATCHED,
                format!(
                    "annotation records ran out; {} span(s) left unannotated",
                    self.report.unmatched_spans
                ),
            )
            .at_span(first);
            self.record(diagnostic);
        }
        self.report.unmatched_records = self.records.len() - self.cursor;
        if self.report.unmatched_records > 0 {
            let diagnostic = Diagnostic::new(
                W_RECORDS_UNUSED,
                format!(
                    "{} annotation record(s) left over after the last span",
                    self.report.unmatched_records
                ),
            )
            .at_record(self.cursor);
            self.record(diagnostic);
        }
        self.report
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        warn!(code = diagnostic.code, "{}", diagnostic.message);
        self.report.diagnostics.push(diagnostic);
    }
}
