use quire_common::path::PathError;
use thiserror::Error;

use crate::lock::LockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    InvalidId,
    LockTimeout,
    IoFailure,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidId => "INVALID_ID",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::IoFailure => "IO_FAILURE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by mutating history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("version `{version_id}` not found for {collection}/{doc_id}")]
    VersionNotFound { collection: String, doc_id: String, version_id: String },

    #[error("invalid {what} `{value}`: {source}")]
    InvalidIdentifier {
        what: &'static str,
        value: String,
        #[source]
        source: PathError,
    },

    #[error(transparent)]
    LockTimeout(#[from] LockError),

    #[error("history storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl HistoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::VersionNotFound { .. } => ErrorCode::NotFound,
            Self::InvalidIdentifier { .. } => ErrorCode::InvalidId,
            Self::LockTimeout(_) => ErrorCode::LockTimeout,
            Self::Storage(_) => ErrorCode::IoFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VersionNotFound { .. })
    }

    pub(crate) fn not_found(collection: &str, doc_id: &str, version_id: &str) -> Self {
        Self::VersionNotFound {
            collection: collection.to_string(),
            doc_id: doc_id.to_string(),
            version_id: version_id.to_string(),
        }
    }
}
