//! Object model: blobs, trees and commits
//!
//! Every object serializes to `"<type> <len>\0<content>"`; its hash is the
//! SHA-1 of that byte string. [`Object`] is the closed set of kinds the store
//! understands, and [`Object::from_data`] is the single entry point for turning
//! stored bytes back into a typed value.

pub mod blob;
pub mod commit;
pub mod tree;

pub use blob::Blob;
pub use commit::{format_timezone, parse_timezone, Author, Commit};
pub use tree::{FileMode, Tree, TreeEntry};

use crate::error::{GroveError, Result};
use crate::hash::ObjectType;
use std::borrow::Cow;
use std::fmt;

/// Any storable object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// File contents
    Blob(Blob),
    /// Directory listing
    Tree(Tree),
    /// Snapshot metadata
    Commit(Commit),
}

impl Object {
    /// Parse header-prefixed object data
    ///
    /// # Errors
    ///
    /// - [`GroveError::Format`] if the header is malformed, names an unknown
    ///   type, or its length disagrees with the content
    /// - Any parse error of the tree or commit content
    pub fn from_data(data: &[u8]) -> Result<Self> {
        let (object_type, content) = split_header(data)?;
        match object_type {
            ObjectType::Blob => Ok(Object::Blob(Blob::new(content))),
            ObjectType::Tree => Tree::parse_content(content).map(Object::Tree),
            ObjectType::Commit => Commit::parse_content(content).map(Object::Commit),
        }
    }

    /// Type tag written in the header
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Blob(_) => ObjectType::Blob,
            Object::Tree(_) => ObjectType::Tree,
            Object::Commit(_) => ObjectType::Commit,
        }
    }

    /// Hex content hash
    pub fn hash(&self) -> &str {
        match self {
            Object::Blob(b) => b.hash(),
            Object::Tree(t) => t.hash(),
            Object::Commit(c) => c.hash(),
        }
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        match self {
            Object::Blob(b) => b.size(),
            Object::Tree(t) => t.size(),
            Object::Commit(c) => c.size(),
        }
    }

    /// `"<type> <size>\0"` header
    pub fn header(&self) -> String {
        match self {
            Object::Blob(b) => b.header(),
            Object::Tree(t) => t.header(),
            Object::Commit(c) => c.header(),
        }
    }

    /// Content bytes, borrowed for blobs and encoded on demand otherwise
    pub fn content(&self) -> Cow<'_, [u8]> {
        match self {
            Object::Blob(b) => Cow::Borrowed(b.content()),
            Object::Tree(t) => Cow::Owned(t.content()),
            Object::Commit(c) => Cow::Owned(c.content()),
        }
    }

    /// Header followed by content; this is what gets compressed to disk
    pub fn data(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.data(),
            Object::Tree(t) => t.data(),
            Object::Commit(c) => c.data(),
        }
    }

    /// The blob, if this is one
    pub fn into_blob(self) -> Option<Blob> {
        match self {
            Object::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// The tree, if this is one
    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Object::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// The commit, if this is one
    pub fn into_commit(self) -> Option<Commit> {
        match self {
            Object::Commit(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}

/// Human-readable rendering as printed by `cat-file -p`
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Blob(b) => f.write_str(&String::from_utf8_lossy(b.content())),
            Object::Tree(t) => write!(f, "{}", t),
            Object::Commit(c) => write!(f, "{}", c),
        }
    }
}

/// Split `"<type> <len>\0<content>"` into its type and content
///
/// The declared length must equal the number of content bytes.
pub(crate) fn split_header(data: &[u8]) -> Result<(ObjectType, &[u8])> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GroveError::format("invalid object format: no null byte after header"))?;
    let header = std::str::from_utf8(&data[..nul])
        .map_err(|_| GroveError::format("invalid object header: not UTF-8"))?;
    let content = &data[nul + 1..];

    let (type_tag, len) = header
        .split_once(' ')
        .ok_or_else(|| GroveError::format(format!("invalid object header: {:?}", header)))?;
    let object_type: ObjectType = type_tag
        .parse()
        .map_err(|_| GroveError::format(format!("unknown object type: {}", type_tag)))?;
    let len: usize = len
        .parse()
        .map_err(|_| GroveError::format(format!("invalid object length: {:?}", len)))?;

    if len != content.len() {
        return Err(GroveError::format(format!(
            "object length mismatch: header says {}, content is {} bytes",
            len,
            content.len()
        )));
    }
    Ok((object_type, content))
}
