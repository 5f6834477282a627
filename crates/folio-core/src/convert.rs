use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::annotate::{AnnotationOptions, AnnotationRecord, MatchReport, annotate};
use crate::outline::OutlineOptions;
use crate::paginate::{PaginationOptions, paginate};
use crate::serialize::{SerializationError, SerializeOptions, serialize};
use crate::source::{Recognizer, SourceError, read_events};
use crate::stack::StructuralError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("malformed tag nesting: {0}")]
    Structural(#[from] StructuralError),
    #[error("cannot render output: {0}")]
    Serialization(#[from] SerializationError),
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub recognizer: Recognizer,
    pub pagination: PaginationOptions,
    pub annotation: AnnotationOptions,
    pub serialize: SerializeOptions,
    pub outline: OutlineOptions,
}

#[derive(Clone, Debug)]
pub struct Conversion {
    pub html: String,
    pub report: MatchReport,
}

/// Runs the whole pipeline over a tag-mapped document: read, paginate,
/// annotate, serialize.
pub fn convert(
    source: &str,
    records: &[AnnotationRecord],
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let events = read_events(source, &options.recognizer)?;
    debug!(events = events.len(), records = records.len(), "read source document");
    let paginated = paginate(events, &options.pagination)?;
    let annotated = annotate(paginated, records, &options.annotation);
    let html = serialize(&annotated.events, &options.serialize)?;
    Ok(Conversion {
        html,
        report: annotated.report,
    })
}
