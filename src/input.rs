//! Reading markdown from a file or standard input.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Component, Path, PathBuf};

/// Why a document could not be read.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("access denied: {} is outside the current directory", .0.display())]
    AccessDenied(PathBuf),
    #[error("{}: no such file", .0.display())]
    NotFound(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: not valid UTF-8", .0.display())]
    InvalidUtf8(PathBuf),
}

const STDIN_LABEL: &str = "<stdin>";

/// Read a document from `path`, or from standard input when `path` is `None`.
///
/// Paths are resolved against the current directory and must stay inside it.
/// An interactive standard input yields an empty document.
///
/// # Errors
///
/// See [`InputError`].
pub fn read_document(path: Option<&Path>) -> Result<String, InputError> {
    match path {
        Some(path) => {
            let cwd = std::env::current_dir().map_err(|source| InputError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            read_file_within(path, &cwd)
        }
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                tracing::debug!("stdin is a terminal, nothing to read");
                return Ok(String::new());
            }
            read_stream(stdin.lock(), Path::new(STDIN_LABEL))
        }
    }
}

/// Read `path` after checking that it resolves inside `base`.
///
/// The containment check is lexical and happens before the file is touched,
/// so a path outside `base` is denied whether or not it exists.
pub fn read_file_within(path: &Path, base: &Path) -> Result<String, InputError> {
    let base = normalize(base);
    let resolved = normalize(&base.join(path));
    if !resolved.starts_with(&base) {
        return Err(InputError::AccessDenied(path.to_path_buf()));
    }

    let bytes = fs::read(&resolved).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            InputError::NotFound(path.to_path_buf())
        } else {
            InputError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    tracing::debug!(path = %resolved.display(), bytes = bytes.len(), "read document");
    String::from_utf8(bytes).map_err(|_| InputError::InvalidUtf8(path.to_path_buf()))
}

/// Read a stream to its end.
pub fn read_stream(mut reader: impl Read, label: &Path) -> Result<String, InputError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| InputError::Io {
            path: label.to_path_buf(),
            source,
        })?;
    String::from_utf8(bytes).map_err(|_| InputError::InvalidUtf8(label.to_path_buf()))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
