//! Parsing engine capability and its PDFium implementation

use crate::error::{Error, Result};
use crate::pdf::document::{
    DocumentMeta, Fill, FormField, Line, Page, ParsedDocument, TextItem, TextRun,
};
use pdfium_render::prelude::*;
use std::path::Path;

/// Path objects no thicker than this (in points) are reported as rules
/// instead of fills.
const LINE_THICKNESS: f32 = 2.0;

/// Turns a PDF on disk into a [`ParsedDocument`].
///
/// Implementations may block; [`ParseInvoker`](super::ParseInvoker) runs
/// them on the blocking pool and bounds them with a timeout.
pub trait DocumentParser: Send + Sync + 'static {
    fn parse(&self, path: &Path) -> Result<ParsedDocument>;
}

/// Production parser backed by PDFium
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumParser;

impl DocumentParser for PdfiumParser {
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let data = std::fs::read(path)?;
        let pdfium = create_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&data, None)
            .map_err(map_pdfium_error)?;

        let meta = extract_metadata(&document);

        let pdf_pages = document.pages();
        let mut pages = Vec::with_capacity(pdf_pages.len() as usize);
        for index in 0..pdf_pages.len() {
            let page = pdf_pages.get(index).map_err(|e| Error::ParseEngine {
                reason: format!("Failed to get page {}: {}", index + 1, e),
            })?;
            pages.push(convert_page(&page));
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "parsed document");

        Ok(ParsedDocument {
            meta: Some(meta),
            pages,
        })
    }
}

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::ParseEngine {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::ParseEngine {
                reason: "PDF is password protected".to_string(),
            }
        }
        _ => Error::ParseEngine {
            reason: format!("{}", err),
        },
    }
}

fn extract_metadata(document: &PdfDocument) -> DocumentMeta {
    let meta = document.metadata();
    let tag = |tag_type: PdfDocumentMetadataTagType| {
        meta.get(tag_type).map(|t| t.value().to_string())
    };

    DocumentMeta {
        title: tag(PdfDocumentMetadataTagType::Title),
        author: tag(PdfDocumentMetadataTagType::Author),
        subject: tag(PdfDocumentMetadataTagType::Subject),
        creator: tag(PdfDocumentMetadataTagType::Creator),
        producer: tag(PdfDocumentMetadataTagType::Producer),
        creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
        modification_date: tag(PdfDocumentMetadataTagType::ModificationDate),
    }
}

/// Convert a PDFium page. Y coordinates are flipped so they grow downwards
/// from the top edge.
fn convert_page(page: &PdfPage) -> Page {
    let width = page.width().value;
    let height = page.height().value;

    // One text item per segment; a segment shares a single text style
    let texts = match page.text() {
        Ok(text) => text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                TextItem {
                    x: bounds.left().value,
                    y: height - bounds.top().value,
                    runs: vec![TextRun::from_plain(&segment.text())],
                }
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    let fields = page
        .annotations()
        .iter()
        .filter_map(|annotation| {
            let field = annotation.as_form_field()?;
            let (x, y, w, h) = annotation
                .bounds()
                .map(|rect| {
                    (
                        rect.left().value,
                        height - rect.top().value,
                        rect.width().value,
                        rect.height().value,
                    )
                })
                .unwrap_or_default();

            Some(FormField {
                id: field.name(),
                field_type: Some(format!("{:?}", field.field_type()).to_lowercase()),
                x,
                y,
                w,
                h,
            })
        })
        .collect();

    let mut h_lines = Vec::new();
    let mut v_lines = Vec::new();
    let mut fills = Vec::new();

    for object in page.objects().iter() {
        if object.as_path_object().is_none() {
            continue;
        }
        let Ok(bounds) = object.bounds() else {
            continue;
        };

        let x = bounds.left().value;
        let y = height - bounds.top().value;
        let w = bounds.width().value;
        let h = bounds.height().value;

        if h <= LINE_THICKNESS && w > h {
            h_lines.push(Line {
                x,
                y,
                length: w,
                thickness: h,
            });
        } else if w <= LINE_THICKNESS && h > w {
            v_lines.push(Line {
                x,
                y,
                length: h,
                thickness: w,
            });
        } else {
            fills.push(Fill { x, y, w, h });
        }
    }

    Page {
        width,
        height,
        texts,
        fields,
        h_lines,
        v_lines,
        fills,
    }
}
