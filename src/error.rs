//! Error types for the remote file client and the document codec.
//!
//! Library seams return these typed errors so callers can match on them.
//! The best-effort layer of [`RemoteFiles`](crate::remote::RemoteFiles)
//! collapses them into empty values or `false` after logging.

use thiserror::Error;

/// Failure of a single remote file operation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No remote store is configured. Triggers the sample-data fallback.
    #[error("remote store is not configured")]
    NotConfigured,

    /// The path does not exist on the configured branch.
    #[error("not found: {0}")]
    NotFound(String),

    /// The supplied revision does not match the current remote revision,
    /// or a create targeted a file that already exists.
    #[error("revision conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    /// The remote answered with an unexpected HTTP status.
    #[error("remote returned HTTP {status} for {path}: {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    /// Network-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be interpreted (bad JSON, bad base64, not UTF-8).
    #[error("invalid response for {path}: {message}")]
    Decode { path: String, message: String },

    /// The identity provider could not supply a credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A required argument was missing (e.g. an empty revision on delete).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RemoteError {
    /// Whether this error is a stale-revision conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict { .. })
    }

    /// Whether this error means the path simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// Failure to parse a document's metadata block.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("metadata block opened with '---' but never closed")]
    Unterminated,

    #[error("metadata block is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("metadata block must be a mapping of key: value pairs")]
    NotAMapping,
}
