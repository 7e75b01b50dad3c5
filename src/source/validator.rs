//! File validation performed before a PDF is handed to the parser

use crate::error::{Error, Result};
use crate::source::safety::{is_safe_path, resolve_path};
use std::fs::File;
use std::io::{ErrorKind, Read};

/// Default maximum file size (50 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Magic bytes every accepted file must start with
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

/// Validates candidate paths: safety, existence, extension, file type, size
/// and signature, in that order. The first failing check wins.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_bytes: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FileValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a caller-supplied path
    pub fn validate(&self, path: &str) -> Result<()> {
        if !is_safe_path(path) {
            return Err(Error::UnsafePath {
                path: path.to_string(),
            });
        }

        let resolved = resolve_path(path)?;

        let not_found = |e: std::io::Error| {
            tracing::debug!(path = %resolved.display(), error = %e, "file not accessible");
            Error::NotFound {
                path: path.to_string(),
            }
        };
        let metadata = std::fs::metadata(&resolved).map_err(not_found)?;
        // A file that exists but cannot be opened is treated as absent
        let file = if metadata.is_file() {
            Some(File::open(&resolved).map_err(not_found)?)
        } else {
            None
        };

        let extension = resolved
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        if extension.as_deref() != Some("pdf") {
            return Err(Error::InvalidExtension {
                extension: extension
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_else(|| "(none)".to_string()),
            });
        }

        let Some(file) = file else {
            return Err(Error::IsDirectory {
                path: path.to_string(),
            });
        };

        if metadata.len() > self.max_bytes {
            return Err(Error::TooLarge {
                size: metadata.len(),
                max_size: self.max_bytes,
            });
        }

        check_signature(file)
    }
}

/// Read the first four bytes and compare them against `%PDF`.
/// The handle is dropped on every return path.
fn check_signature(mut file: File) -> Result<()> {
    let mut header = [0u8; 4];

    match file.read_exact(&mut header) {
        Ok(()) if &header == PDF_SIGNATURE => Ok(()),
        Ok(()) => Err(Error::MissingSignature),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::MissingSignature),
        Err(e) => Err(Error::Io(e)),
    }
}
