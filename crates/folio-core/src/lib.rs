mod annotate;
mod convert;
mod diagnostic;
mod event;
mod flex;
mod normalize;
mod outline;
mod paginate;
mod serialize;
mod source;
mod stack;

pub use annotate::{
    AnnotationOptions, AnnotationRecord, Annotated, ElementSpec, MatchReport, annotate,
};
pub use convert::{Conversion, ConvertError, ConvertOptions, convert};
pub use diagnostic::{Diagnostic, W_KEY_MISMATCH, W_RECORDS_UNUSED, W_SPANS_UNMATCHED};
pub use event::{Attribute, BreakKind, BreakMarker, Element, MarkupEvent};
pub use flex::{FlexError, FlexWord, import_flex, read_flex_words};
pub use normalize::normalize_word;
pub use outline::{OutlineOptions, OutlineSection, collect_sections, outline, outline_events};
pub use paginate::{PaginationOptions, Paginator, paginate};
pub use serialize::{SerializationError, SerializeOptions, serialize};
pub use source::{Recognizer, SourceError, read_events};
pub use stack::{Position, StructuralError, TagStack};
