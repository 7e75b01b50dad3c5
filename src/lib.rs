//! PDF Reader MCP Server Library
//!
//! This crate provides MCP tools for reading local PDF files:
//! - `extract_text`: Extract text and metadata as plain text, a JSON summary,
//!   or the full parsed document
//! - `extract_form_fields`: List form fields in document order
//!
//! Every path is checked by [`source::FileValidator`] before it reaches the
//! parsing engine.

pub mod error;
pub mod pdf;
pub mod server;
pub mod source;

pub use error::{Error, Result};
pub use server::{
    run_server, run_server_with_config, ExtractFormFieldsParams, ExtractTextParams, PdfServer,
    ServerConfig, ToolCall, ToolResponse,
};
