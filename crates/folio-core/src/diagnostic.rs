use serde::Serialize;

pub const W_KEY_MISMATCH: &str = "W_KEY_MISMATCH";
pub const W_SPANS_UNMATCHED: &str = "W_SPANS_UNMATCHED";
pub const W_RECORDS_UNUSED: &str = "W_RECORDS_UNUSED";

/// A recoverable condition found while matching annotations. The run still
/// produces full output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    /// Zero-based index of the annotatable span in document order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_index: Option<usize>,
    /// Zero-based index into the annotation record list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
}

impl Diagnostic {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span_index: None,
            record_index: None,
        }
    }

    pub fn at_span(mut self, index: usize) -> Self {
        self.span_index = Some(index);
        self
    }

    pub fn at_record(mut self, index: usize) -> Self {
        self.record_index = Some(index);
        self
    }
}
