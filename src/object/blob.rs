//! Blob objects: raw file content

use crate::error::{GroveError, Result};
use crate::hash::{compute_hash, object_header, ObjectType};
use std::fmt;
use std::path::Path;

/// File content plus its object hash
///
/// Blobs are immutable; the hash is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content: Vec<u8>,
    hash: String,
}

impl Blob {
    /// Create a blob from raw bytes
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let hash = compute_hash(&content, ObjectType::Blob);
        Self { content, hash }
    }

    /// Create a blob from the contents of a file
    ///
    /// # Errors
    ///
    /// - [`GroveError::Io`] if the file cannot be read
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)
            .map_err(|e| GroveError::io(format!("reading file {}", path.display()), e))?;
        Ok(Self::new(content))
    }

    /// Object hash (40 hex characters)
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Raw content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// `"blob <size>\0"`
    pub fn header(&self) -> String {
        object_header(ObjectType::Blob, self.size())
    }

    /// Header followed by content
    pub fn data(&self) -> Vec<u8> {
        let header = self.header();
        let mut data = Vec::with_capacity(header.len() + self.content.len());
        data.extend_from_slice(header.as_bytes());
        data.extend_from_slice(&self.content);
        data
    }

    /// Consume the blob, returning its content
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob{{hash: {}, size: {} bytes}}", self.hash, self.size())
    }
}
