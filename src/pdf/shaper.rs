//! Shaping parsed documents into tool responses

use crate::error::{Error, Result};
use crate::pdf::document::{DocumentMeta, ParsedDocument};
use serde::Serialize;

/// Requested response shape for `extract_text`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain concatenated text
    #[default]
    Text,
    /// Page count, text, and metadata
    Json,
    /// The parsed document as-is
    Detailed,
}

impl OutputFormat {
    /// Parse a format name. Unrecognized names fall back to [`OutputFormat::Text`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => OutputFormat::Json,
            "detailed" => OutputFormat::Detailed,
            "text" => OutputFormat::Text,
            other => {
                tracing::debug!(format = other, "unknown format, using text");
                OutputFormat::Text
            }
        }
    }
}

/// Metadata block of a [`DocumentSummary`]; absent entries are empty strings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
}

impl From<Option<&DocumentMeta>> for SummaryMetadata {
    fn from(meta: Option<&DocumentMeta>) -> Self {
        let Some(meta) = meta else {
            return Self::default();
        };
        let field = |value: &Option<String>| value.clone().unwrap_or_default();

        Self {
            title: field(&meta.title),
            author: field(&meta.author),
            subject: field(&meta.subject),
            creator: field(&meta.creator),
            producer: field(&meta.producer),
            creation_date: field(&meta.creation_date),
            modification_date: field(&meta.modification_date),
        }
    }
}

/// Response body of the `json` format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub pages: usize,
    pub text: String,
    pub metadata: SummaryMetadata,
}

/// Shaped result of `extract_text`
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    PlainText(String),
    Summary(DocumentSummary),
    Raw(ParsedDocument),
}

impl ExtractionResult {
    /// Render as response text: plain text verbatim, everything else as
    /// indented JSON.
    pub fn into_text(self) -> Result<String> {
        match self {
            ExtractionResult::PlainText(text) => Ok(text),
            ExtractionResult::Summary(summary) => Ok(serde_json::to_string_pretty(&summary)?),
            ExtractionResult::Raw(document) => Ok(serde_json::to_string_pretty(&document)?),
        }
    }
}

/// Form field descriptor returned by `extract_form_fields`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormFieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Always empty: the document tree carries no live values
    pub value: String,
    /// Always empty: the document tree carries no choice options
    pub options: Vec<String>,
}

/// Shape a document into the requested format
pub fn shape(document: ParsedDocument, format: OutputFormat) -> Result<ExtractionResult> {
    match format {
        OutputFormat::Text => Ok(ExtractionResult::PlainText(extract_plain_text(&document)?)),
        OutputFormat::Json => Ok(ExtractionResult::Summary(DocumentSummary {
            pages: document.pages.len(),
            text: extract_plain_text(&document)?,
            metadata: SummaryMetadata::from(document.meta.as_ref()),
        })),
        OutputFormat::Detailed => Ok(ExtractionResult::Raw(document)),
    }
}

/// Concatenate every decoded run followed by a space, with a newline after
/// each page, then trim the result.
pub fn extract_plain_text(document: &ParsedDocument) -> Result<String> {
    let mut text = String::new();

    for page in &document.pages {
        for item in &page.texts {
            for run in &item.runs {
                check_escapes(&run.text)?;
                let decoded = urlencoding::decode(&run.text).map_err(|e| Error::TextDecode {
                    reason: e.to_string(),
                })?;
                text.push_str(&decoded);
                text.push(' ');
            }
        }
        text.push('\n');
    }

    Ok(text.trim().to_string())
}

/// Every `%` must start a two-digit hex escape
fn check_escapes(encoded: &str) -> Result<()> {
    let bytes = encoded.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(Error::TextDecode {
                    reason: format!("malformed percent escape at byte {i} in {encoded:?}"),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// List every form field in document order
pub fn extract_fields(document: &ParsedDocument) -> Vec<FormFieldInfo> {
    document
        .pages
        .iter()
        .flat_map(|page| page.fields.iter())
        .map(|field| FormFieldInfo {
            name: field.id.clone().unwrap_or_else(|| "unnamed".to_string()),
            field_type: field
                .field_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            value: String::new(),
            options: Vec::new(),
        })
        .collect()
}
