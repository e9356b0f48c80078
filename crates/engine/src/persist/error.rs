use thiserror::Error;

/// Failure while saving or loading a footprint document. `path` names the
/// node in the document tree, for example `world.boards[1].layers[0]`.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{path}: missing required child collection `{field}`")]
    MissingCollection { path: String, field: &'static str },
    #[error("{path}: child collection `{field}` must be a sequence")]
    NotASequence { path: String, field: &'static str },
    #[error("{path}: expected an object")]
    NotAnObject { path: String },
    #[error("{path}: field `{field}` has an unexpected shape: {source}")]
    Scalar {
        path: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: failed to encode field `{field}`: {source}")]
    Encode {
        path: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: no `{kind}` subtype registered under `{subtype}`")]
    UnknownSubtype {
        path: String,
        kind: &'static str,
        subtype: String,
    },
    #[error("{path}: child collection `{field}` expects {expected} element(s), found {actual}")]
    ChildCount {
        path: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
}

impl PersistError {
    pub fn invalid(path: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::MissingCollection { path, .. }
            | Self::NotASequence { path, .. }
            | Self::NotAnObject { path }
            | Self::Scalar { path, .. }
            | Self::Encode { path, .. }
            | Self::UnknownSubtype { path, .. }
            | Self::ChildCount { path, .. }
            | Self::Invalid { path, .. } => path,
        }
    }
}
