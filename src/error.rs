//! Error types for PDF Reader MCP Server

use thiserror::Error;

/// Result type alias for PDF Reader MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PDF Reader MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// Path attempts traversal or points into a protected system location
    #[error("Invalid or unsafe file path: {path}")]
    UnsafePath { path: String },

    /// File does not exist or cannot be accessed
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// File extension is not `.pdf`
    #[error("Invalid file type: {extension}. Only .pdf files are allowed")]
    InvalidExtension { extension: String },

    /// Path resolves to a directory
    #[error("Path is a directory, not a file: {path}")]
    IsDirectory { path: String },

    /// File exceeds the configured size limit
    #[error("File too large: {size} bytes. Maximum size is {} MB", .max_size / (1024 * 1024))]
    TooLarge { size: u64, max_size: u64 },

    /// File does not start with the `%PDF` magic bytes
    #[error("Invalid PDF file: missing %PDF signature")]
    MissingSignature,

    /// Parsing engine did not finish in time
    #[error("PDF parsing timed out after {timeout:?}")]
    ParseTimeout { timeout: std::time::Duration },

    /// Parsing engine reported a failure
    #[error("PDF parsing failed: {reason}")]
    ParseEngine { reason: String },

    /// Tool name is not registered
    #[error("Unknown tool: {name}")]
    UnknownOperation { name: String },

    /// Tool arguments do not match the expected shape
    #[error("Invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// Text run is not valid percent-encoded UTF-8
    #[error("Failed to decode text run: {reason}")]
    TextDecode { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error was raised before the parser was ever started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnsafePath { .. }
                | Error::NotFound { .. }
                | Error::InvalidExtension { .. }
                | Error::IsDirectory { .. }
                | Error::TooLarge { .. }
                | Error::MissingSignature
        )
    }
}
