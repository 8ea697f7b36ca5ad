//! Content hashing for stored objects
//!
//! Every object is identified by the SHA-1 digest of its canonical encoding:
//!
//! ```text
//! "<type> <content-byte-length>\0<content>"
//! ```
//!
//! The digest is used for identity and deduplication only. Because the header
//! embeds the content length, callers must hash exactly the canonical content
//! an object produces, never an arbitrary slice of it.
//!
//! ## Example
//!
//! ```rust
//! use grove::hash::{compute_hash, ObjectType};
//!
//! let hash = compute_hash(b"", ObjectType::Blob);
//! assert_eq!(hash, "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
//! ```

use crate::error::{GroveError, Result};
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;

/// Length of a raw SHA-1 digest in bytes
pub const HASH_BYTE_LEN: usize = 20;

/// Length of a SHA-1 digest rendered as hex
pub const HASH_HEX_LEN: usize = 40;

/// Number of hex characters used for the shard directory under `objects/`
pub const HASH_DIR_PREFIX_LEN: usize = 2;

/// The three kinds of object the store understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// File content
    Blob,
    /// Directory snapshot
    Tree,
    /// Snapshot metadata
    Commit,
}

impl ObjectType {
    /// Tag used in object headers
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = GroveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            other => Err(GroveError::InvalidObjectType(other.to_string())),
        }
    }
}

/// Build the `"<type> <len>\0"` header for an object
pub fn object_header(object_type: ObjectType, content_len: usize) -> String {
    format!("{} {}\0", object_type, content_len)
}

/// Compute the hex object hash of `content` for the given type
pub fn compute_hash(content: &[u8], object_type: ObjectType) -> String {
    let mut hasher = Sha1::new();
    hasher.update(object_header(object_type, content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Compute an object hash from a textual type tag
///
/// # Errors
///
/// - [`GroveError::InvalidObjectType`] if `type_tag` is not `blob`, `tree` or `commit`
pub fn compute_hash_for(content: &[u8], type_tag: &str) -> Result<String> {
    let object_type: ObjectType = type_tag.parse()?;
    Ok(compute_hash(content, object_type))
}

/// Check that `hash` is exactly 40 hexadecimal characters
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Abbreviate a hash for log output
pub(crate) fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
