//! Error types for the Grove library
//!
//! This module defines all error types that can occur while encoding, storing
//! and reading objects. Every error carries enough context (operation, hash or
//! path) to diagnose a failure without a debugger. Nothing in the library
//! recovers from these silently; they bubble up to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the Grove library
pub type Result<T> = std::result::Result<T, GroveError>;

/// Main error type for all Grove operations
#[derive(Debug, Error)]
pub enum GroveError {
    /// Hash requested for an unrecognised object type tag
    #[error("Invalid object type: {0}")]
    InvalidObjectType(String),

    /// A value failed construction-time validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors during file operations
    #[error("IO error while {context}: {source}")]
    Io {
        /// Operation and path that failed
        context: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Compression failed on the write path
    #[error("Compression error: {0}")]
    Compression(String),

    /// Stored bytes are not a valid compressed stream
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    /// Decompressed bytes do not follow the object wire format
    #[error("Format error: {0}")]
    Format(String),

    /// Object not found in the object store
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Stored header names a different type than the one requested
    #[error("Object {hash} is a {actual}, not a {expected}")]
    TypeMismatch {
        /// Hash that was requested
        hash: String,
        /// Type the caller asked for
        expected: String,
        /// Type found in the stored header
        actual: String,
    },

    /// Recomputed hash disagrees with the hash used for lookup
    #[error("Hash mismatch - expected: {expected}, actual: {actual}")]
    HashMismatch {
        /// Expected hash value
        expected: String,
        /// Actual computed hash value
        actual: String,
    },

    /// Repository metadata directory already exists
    #[error("Repository already exists at path: {0:?}")]
    RepositoryExists(PathBuf),

    /// No repository metadata directory was found
    #[error("Repository not found at path: {0:?}")]
    RepositoryNotFound(PathBuf),

    /// Errors reading or writing repository metadata
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GroveError {
    /// Wrap an I/O error with the operation that caused it
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        GroveError::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a validation error with a custom message
    pub fn validation(msg: impl Into<String>) -> Self {
        GroveError::Validation(msg.into())
    }

    /// Create a format error with a custom message
    pub fn format(msg: impl Into<String>) -> Self {
        GroveError::Format(msg.into())
    }

    /// Create a compression error with a custom message
    pub fn compression(msg: impl Into<String>) -> Self {
        GroveError::Compression(msg.into())
    }

    /// Create a corrupt stream error with a custom message
    pub fn corrupt_stream(msg: impl Into<String>) -> Self {
        GroveError::CorruptStream(msg.into())
    }

    /// Attach the object hash to message-only variants.
    ///
    /// Variants that already carry a hash or path are returned unchanged.
    pub fn in_object(self, hash: &str) -> Self {
        match self {
            GroveError::Validation(msg) => GroveError::Validation(format!("object {}: {}", hash, msg)),
            GroveError::Format(msg) => GroveError::Format(format!("object {}: {}", hash, msg)),
            GroveError::CorruptStream(msg) => {
                GroveError::CorruptStream(format!("object {}: {}", hash, msg))
            }
            GroveError::Compression(msg) => {
                GroveError::Compression(format!("object {}: {}", hash, msg))
            }
            other => other,
        }
    }

    /// Check if this error indicates corrupted or non-canonical storage
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            GroveError::CorruptStream(_)
                | GroveError::Format(_)
                | GroveError::HashMismatch { .. }
                | GroveError::TypeMismatch { .. }
        )
    }

    /// Check if this error means the requested object or repository is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GroveError::ObjectNotFound(_) | GroveError::RepositoryNotFound(_)
        )
    }
}
