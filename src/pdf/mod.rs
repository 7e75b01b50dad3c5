//! PDF processing layer
//!
//! Parsing is delegated to a [`DocumentParser`]; this module bounds the
//! parse with a timeout and shapes the resulting document tree.

mod document;
mod engine;
mod invoker;
mod shaper;

pub use document::{DocumentMeta, Fill, FormField, Line, Page, ParsedDocument, TextItem, TextRun};
pub use engine::{DocumentParser, PdfiumParser};
pub use invoker::{ParseInvoker, DEFAULT_PARSE_TIMEOUT};
pub use shaper::{
    extract_fields, extract_plain_text, shape, DocumentSummary, ExtractionResult, FormFieldInfo,
    OutputFormat, SummaryMetadata,
};
