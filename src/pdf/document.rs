//! Structured document tree produced by a [`DocumentParser`](super::DocumentParser)

use serde::{Deserialize, Serialize};

/// A parsed PDF: optional metadata plus pages in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// Document information dictionary entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
}

/// A single page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    #[serde(default)]
    pub texts: Vec<TextItem>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub h_lines: Vec<Line>,
    #[serde(default)]
    pub v_lines: Vec<Line>,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

/// Positioned block of text made of one or more runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

/// Contiguous span of text. `text` is percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
}

impl TextRun {
    /// Build a run from plain text, percent-encoding it.
    pub fn from_plain(text: &str) -> Self {
        Self {
            text: urlencoding::encode(text).into_owned(),
        }
    }
}

/// Interactive form field widget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub w: f32,
    #[serde(default)]
    pub h: f32,
}

/// Horizontal or vertical rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub thickness: f32,
}

/// Filled rectangle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_run_from_plain_encodes() {
        assert_eq!(TextRun::from_plain("Hello World").text, "Hello%20World");
        assert_eq!(TextRun::from_plain("50%").text, "50%25");
    }

    #[test]
    fn test_deserialize_sparse_tree() {
        let doc: ParsedDocument = serde_json::from_str(
            r#"{"pages":[{"width":612.0,"height":792.0,"texts":[{"x":1.0,"y":2.0,"runs":[{"text":"A"}]}]}]}"#,
        )
        .unwrap();

        assert!(doc.meta.is_none());
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].fields.is_empty());
        assert_eq!(doc.pages[0].texts[0].runs[0].text, "A");
    }
}
