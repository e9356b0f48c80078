use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn read_document(path: &Path) -> Result<Value, DocumentFileError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DocumentFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `doc` as pretty JSON next to `path` and renames it into place, so a
/// failed write never leaves a truncated document behind.
pub fn write_document_atomic(path: &Path, doc: &Value) -> Result<(), DocumentFileError> {
    let text = serde_json::to_string_pretty(doc).map_err(|source| DocumentFileError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let write_err = |source| DocumentFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let staging = staging_path_for(path);
    if let Err(error) = write_and_sync(&staging, text.as_bytes()) {
        let _ = fs::remove_file(&staging);
        return Err(write_err(error));
    }
    if let Err(error) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(write_err(error));
    }
    Ok(())
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    path.with_file_name(format!(".{file_name}.partial"))
}
