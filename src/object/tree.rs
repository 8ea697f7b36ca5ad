//! Tree objects: directory snapshots
//!
//! A tree is a sorted list of `(mode, name, hash)` entries. Its canonical
//! content is the concatenation, per entry, of
//!
//! ```text
//! <mode> SP <name> NUL <20 raw hash bytes>
//! ```
//!
//! Entries are ordered by name, with directory names compared as if they
//! carried a trailing `/`. That keeps `foo`, `foo.c` and the directory `foo/`
//! in a single well-defined order, so the same set of entries always produces
//! the same bytes and therefore the same hash.

use crate::error::{GroveError, Result};
use crate::hash::{compute_hash, is_valid_hash, object_header, ObjectType, HASH_BYTE_LEN};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Mode of a tree entry
///
/// A closed set; anything else is rejected when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Regular non-executable file
    Regular,
    /// Executable file
    Executable,
    /// Symbolic link
    Symlink,
    /// Directory (points at another tree)
    Directory,
    /// Submodule reference
    Submodule,
}

impl FileMode {
    /// Mode string as written in tree content
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Directory => "040000",
            FileMode::Submodule => "160000",
        }
    }

    /// Type of object an entry with this mode refers to
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::Directory => ObjectType::Tree,
            FileMode::Submodule => ObjectType::Commit,
            _ => ObjectType::Blob,
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileMode {
    type Err = GroveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "100644" => Ok(FileMode::Regular),
            "100755" => Ok(FileMode::Executable),
            "120000" => Ok(FileMode::Symlink),
            "040000" => Ok(FileMode::Directory),
            "160000" => Ok(FileMode::Submodule),
            other => Err(GroveError::validation(format!("invalid file mode: {}", other))),
        }
    }
}

/// One named reference inside a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: FileMode,
    name: String,
    hash: String,
    raw_hash: [u8; HASH_BYTE_LEN],
}

impl TreeEntry {
    /// Create a validated entry
    ///
    /// The hash is stored in lowercase so entries built from either case
    /// compare equal to entries parsed back from storage.
    ///
    /// # Errors
    ///
    /// - [`GroveError::Validation`] if the name is empty or contains a NUL
    ///   byte, or the hash is not 40 hex characters
    pub fn new(mode: FileMode, name: impl Into<String>, hash: impl AsRef<str>) -> Result<Self> {
        let name = name.into();
        let hash = hash.as_ref();

        if name.is_empty() {
            return Err(GroveError::validation("entry name cannot be empty"));
        }
        if name.contains('\0') {
            return Err(GroveError::validation(format!(
                "entry name {:?} contains a NUL byte",
                name
            )));
        }
        if !is_valid_hash(hash) {
            return Err(GroveError::validation(format!(
                "invalid hash for entry {}: expected 40 hex characters, got {:?}",
                name, hash
            )));
        }

        let hash = hash.to_ascii_lowercase();
        let mut raw_hash = [0u8; HASH_BYTE_LEN];
        hex::decode_to_slice(&hash, &mut raw_hash)
            .map_err(|e| GroveError::validation(format!("invalid hash for entry {}: {}", name, e)))?;

        Ok(Self {
            mode,
            name,
            hash,
            raw_hash,
        })
    }

    /// Entry mode
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Referenced object hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether this entry points at another tree
    pub fn is_directory(&self) -> bool {
        self.mode == FileMode::Directory
    }

    /// Whether this entry is an executable file
    pub fn is_executable(&self) -> bool {
        self.mode == FileMode::Executable
    }

    /// Name used for ordering: directories get a trailing `/`
    fn sort_key(&self) -> Cow<'_, [u8]> {
        if self.is_directory() {
            let mut key = Vec::with_capacity(self.name.len() + 1);
            key.extend_from_slice(self.name.as_bytes());
            key.push(b'/');
            Cow::Owned(key)
        } else {
            Cow::Borrowed(self.name.as_bytes())
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.mode.as_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&self.raw_hash);
    }
}

/// A directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
    hash: String,
}

impl Tree {
    /// Build a tree from entries in any order
    ///
    /// # Errors
    ///
    /// - [`GroveError::Validation`] if `entries` is empty or two entries share a name
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(GroveError::validation("tree must contain at least one entry"));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(GroveError::validation(format!(
                    "duplicate tree entry name: {}",
                    entry.name
                )));
            }
        }

        sort_entries(&mut entries);
        let hash = compute_hash(&encode_entries(&entries), ObjectType::Tree);

        Ok(Self { entries, hash })
    }

    /// Parse canonical tree content (the bytes after the header)
    ///
    /// Parsing stops once no further space byte can be found. A name that is
    /// not NUL-terminated, or a trailing hash shorter than 20 bytes, is a
    /// format error.
    ///
    /// # Errors
    ///
    /// - [`GroveError::Format`] for truncated or non-UTF-8 entries
    /// - [`GroveError::Validation`] for unknown modes and any error from [`Tree::new`]
    pub fn parse_content(content: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset < content.len() {
            let rest = &content[offset..];
            let Some(space) = rest.iter().position(|&b| b == b' ') else {
                break;
            };

            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| GroveError::format("tree entry mode is not UTF-8"))?;
            let mode: FileMode = mode.parse()?;

            let after_mode = &rest[space + 1..];
            let nul = after_mode
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| GroveError::format("invalid tree entry: no null byte after name"))?;
            let name = std::str::from_utf8(&after_mode[..nul])
                .map_err(|_| GroveError::format("tree entry name is not UTF-8"))?;

            let hash_bytes = &after_mode[nul + 1..];
            if hash_bytes.len() < HASH_BYTE_LEN {
                return Err(GroveError::format(format!(
                    "invalid tree entry: incomplete hash for {}",
                    name
                )));
            }
            let hash = hex::encode(&hash_bytes[..HASH_BYTE_LEN]);

            trace!("Parsed tree entry {} {} {}", mode, name, hash);
            entries.push(TreeEntry::new(mode, name, hash)?);
            offset += space + 1 + nul + 1 + HASH_BYTE_LEN;
        }

        Self::new(entries)
    }

    /// Object hash (40 hex characters)
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Entries in canonical order
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Find an entry by name
    pub fn find_entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Canonical content bytes
    pub fn content(&self) -> Vec<u8> {
        encode_entries(&self.entries)
    }

    /// Content length in bytes
    pub fn size(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.mode.as_str().len() + 1 + e.name.len() + 1 + HASH_BYTE_LEN)
            .sum()
    }

    /// `"tree <size>\0"`
    pub fn header(&self) -> String {
        object_header(ObjectType::Tree, self.size())
    }

    /// Header followed by content
    pub fn data(&self) -> Vec<u8> {
        let mut data = self.header().into_bytes();
        data.extend_from_slice(&self.content());
        data
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{} {} {}\t{}",
                entry.mode,
                entry.mode.object_type(),
                entry.hash,
                entry.name
            )?;
        }
        Ok(())
    }
}

/// Stable sort by name, directories compared with a trailing `/`
fn sort_entries(entries: &mut [TreeEntry]) {
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

fn encode_entries(entries: &[TreeEntry]) -> Vec<u8> {
    let mut buf = Vec::new();
    for entry in entries {
        entry.encode_into(&mut buf);
    }
    buf
}
