//! Path safety checks applied before any file is touched

use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute path prefixes that are never served, compared case-insensitively.
pub const DENIED_PREFIXES: &[&str] = &[
    "/etc",
    "/usr",
    "/bin",
    "/sbin",
    "/dev",
    "/proc",
    "/sys",
    "C:\\Windows",
    "C:\\Program Files",
];

/// Check whether a caller-supplied path is safe to open.
///
/// The path is normalized lexically and resolved against the current working
/// directory. It is rejected if the normalized form still contains `..` or
/// `~`, or if the resolved path falls under one of [`DENIED_PREFIXES`].
pub fn is_safe_path(path: &str) -> bool {
    match std::env::current_dir() {
        Ok(cwd) => is_safe_path_from(path, &cwd),
        Err(e) => {
            tracing::warn!(error = %e, "cannot determine working directory");
            false
        }
    }
}

/// Same as [`is_safe_path`], resolving relative paths against `base`.
pub fn is_safe_path_from(path: &str, base: &Path) -> bool {
    let normalized = normalize(Path::new(path));
    let normalized_str = normalized.to_string_lossy();
    if normalized_str.contains("..") || normalized_str.contains('~') {
        return false;
    }

    let resolved = normalize(&base.join(&normalized))
        .to_string_lossy()
        .to_lowercase();

    !DENIED_PREFIXES
        .iter()
        .any(|prefix| resolved.starts_with(&prefix.to_lowercase()))
}

/// Resolve a path to its absolute, normalized form.
pub fn resolve_path(path: &str) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(normalize(&cwd.join(path)))
}

/// Collapse `.` and `..` components without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
