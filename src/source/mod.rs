//! Input path safety and file validation

pub mod safety;
pub mod validator;

pub use safety::{is_safe_path, resolve_path, DENIED_PREFIXES};
pub use validator::{FileValidator, DEFAULT_MAX_FILE_BYTES, PDF_SIGNATURE};
