//! Content-addressable object store
//!
//! Objects live under the repository's metadata directory, sharded by the
//! first two hex characters of their hash:
//!
//! ```text
//! <root>/.grove/
//! └── objects/
//!     └── <prefix>/          # First 2 chars of hash
//!         └── <suffix>       # Remaining 38 chars, zlib-compressed object data
//! ```
//!
//! ## Content Addressing
//!
//! A hash fully determines an object's bytes, so storing an object whose file
//! already exists is a successful no-op. Reads go the other way: every read
//! decompresses, checks the header type, parses, and recomputes the hash from
//! the parsed value. A mismatch means corruption (or a caller bug) and is
//! reported as [`GroveError::HashMismatch`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use grove::{Blob, ObjectStore, GroveConfig};
//!
//! # fn example() -> grove::Result<()> {
//! let store = ObjectStore::new("./project", GroveConfig::default());
//!
//! let blob = Blob::new(b"Hello, world!".to_vec());
//! let hash = store.store(&blob.clone().into())?;
//! assert!(store.exists(&hash));
//!
//! let loaded = store.read_blob(&hash)?;
//! assert_eq!(loaded.content(), blob.content());
//! # Ok(())
//! # }
//! ```
//!
//! The store holds only paths and settings; concurrent writers of the same
//! hash are safe because every write is an atomic rename of a complete file.

use crate::compression::CompressionEngine;
use crate::error::{GroveError, Result};
use crate::hash::{is_valid_hash, short_hash, ObjectType, HASH_DIR_PREFIX_LEN};
use crate::object::{split_header, Blob, Commit, Object, Tree};
use crate::types::GroveConfig;
use crate::utils;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Object store rooted at a repository
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    objects_dir: PathBuf,
    config: GroveConfig,
    compression: CompressionEngine,
}

impl ObjectStore {
    /// Create a store for the repository at `repo_root`
    ///
    /// Nothing is touched on disk; shard directories are created lazily by
    /// [`store`](Self::store).
    pub fn new(repo_root: impl Into<PathBuf>, config: GroveConfig) -> Self {
        let root = repo_root.into();
        let objects_dir = root.join(&config.metadata_dir).join(&config.objects_dir);
        let compression = CompressionEngine::new(config.compression);
        Self {
            root,
            objects_dir,
            config,
            compression,
        }
    }

    /// Repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the object shards
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path at which the object with `hash` is (or would be) stored
    ///
    /// # Errors
    ///
    /// - [`GroveError::Validation`] if `hash` is not 40 hex characters
    pub fn object_path(&self, hash: &str) -> Result<PathBuf> {
        if !is_valid_hash(hash) {
            return Err(GroveError::validation(format!("invalid object hash: {:?}", hash)));
        }
        let hash = hash.to_ascii_lowercase();
        let (prefix, suffix) = hash.split_at(HASH_DIR_PREFIX_LEN);
        Ok(self.objects_dir.join(prefix).join(suffix))
    }

    /// Store an object, returning its hash
    ///
    /// Storing an object that already exists does nothing.
    ///
    /// # Errors
    ///
    /// - [`GroveError::Io`] if the shard directory or file cannot be written,
    ///   or the existing path cannot be inspected
    /// - [`GroveError::Compression`] if the object cannot be compressed
    pub fn store(&self, object: &Object) -> Result<String> {
        let hash = object.hash().to_string();
        let path = self.object_path(&hash)?;

        match fs::symlink_metadata(&path) {
            Ok(_) => {
                debug!("Object {} already exists, skipping write", short_hash(&hash));
                return Ok(hash);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GroveError::io(format!("checking object {}", path.display()), e));
            }
        }

        if let Some(shard) = path.parent() {
            utils::create_dir_all(shard, self.config.dir_mode)?;
        }

        let compressed = self
            .compression
            .compress(&object.data())
            .map_err(|e| e.in_object(&hash))?;
        utils::atomic_write(&path, &compressed, self.config.file_mode)?;

        debug!(
            "Stored {} {} ({} bytes compressed)",
            object.object_type(),
            short_hash(&hash),
            compressed.len()
        );
        Ok(hash)
    }

    /// Whether an object with `hash` is stored
    ///
    /// Invalid hashes and any stat failure count as "not stored".
    pub fn exists(&self, hash: &str) -> bool {
        self.object_path(hash)
            .map(|path| fs::metadata(path).is_ok())
            .unwrap_or(false)
    }

    /// Decompressed object data, header included
    ///
    /// # Errors
    ///
    /// - [`GroveError::ObjectNotFound`] if nothing is stored under `hash`
    /// - [`GroveError::CorruptStream`] if the file does not decompress
    pub fn read_raw(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self.object_path(hash)?;
        let compressed = fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                GroveError::ObjectNotFound(hash.to_string())
            } else {
                GroveError::io(format!("reading object {}", path.display()), e)
            }
        })?;

        let data = self
            .compression
            .decompress(&compressed)
            .map_err(|e| e.in_object(hash))?;
        trace!("Loaded object {} ({} bytes)", short_hash(hash), data.len());
        Ok(data)
    }

    /// Read a blob
    pub fn read_blob(&self, hash: &str) -> Result<Blob> {
        self.read_typed(hash, ObjectType::Blob, |content| Ok(Blob::new(content)), Blob::hash)
    }

    /// Read a tree
    pub fn read_tree(&self, hash: &str) -> Result<Tree> {
        self.read_typed(hash, ObjectType::Tree, Tree::parse_content, Tree::hash)
    }

    /// Read a commit
    pub fn read_commit(&self, hash: &str) -> Result<Commit> {
        self.read_typed(hash, ObjectType::Commit, Commit::parse_content, Commit::hash)
    }

    /// Read an object of whatever type its header declares
    ///
    /// # Errors
    ///
    /// Same as the typed readers, minus [`GroveError::TypeMismatch`].
    pub fn read_object(&self, hash: &str) -> Result<Object> {
        let data = self.read_raw(hash)?;
        let object = Object::from_data(&data).map_err(|e| e.in_object(hash))?;
        verify_hash(hash, object.hash())?;
        Ok(object)
    }

    fn read_typed<T>(
        &self,
        hash: &str,
        expected: ObjectType,
        parse: impl FnOnce(&[u8]) -> Result<T>,
        hash_of: impl Fn(&T) -> &str,
    ) -> Result<T> {
        let data = self.read_raw(hash)?;
        let (actual, content) = split_header(&data).map_err(|e| e.in_object(hash))?;
        if actual != expected {
            return Err(GroveError::TypeMismatch {
                hash: hash.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        let object = parse(content).map_err(|e| e.in_object(hash))?;
        verify_hash(hash, hash_of(&object))?;
        Ok(object)
    }

    /// Hashes of every stored object, sorted
    ///
    /// # Errors
    ///
    /// - [`GroveError::Io`] if a shard directory cannot be listed
    pub fn list_objects(&self) -> Result<Vec<String>> {
        let mut objects = Vec::new();
        if !self.objects_dir.exists() {
            return Ok(objects);
        }

        for shard_entry in read_dir(&self.objects_dir)? {
            let shard_path = shard_entry.path();
            if !shard_path.is_dir() {
                continue;
            }
            let shard_name = shard_entry.file_name().to_string_lossy().to_string();

            for object_entry in read_dir(&shard_path)? {
                if !object_entry.path().is_file() {
                    continue;
                }
                let object_name = object_entry.file_name().to_string_lossy().to_string();
                let hash = format!("{}{}", shard_name, object_name);
                // Skips leftover temp files and anything else that is not an object
                if is_valid_hash(&hash) {
                    objects.push(hash);
                }
            }
        }

        objects.sort();
        Ok(objects)
    }

    /// Object count and total compressed size
    pub fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats::default();
        for hash in self.list_objects()? {
            let path = self.object_path(&hash)?;
            let metadata = fs::metadata(&path)
                .map_err(|e| GroveError::io(format!("reading metadata of {}", path.display()), e))?;
            stats.object_count += 1;
            stats.total_size += metadata.len();
        }
        Ok(stats)
    }
}

/// Summary of the objects on disk
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored objects
    pub object_count: usize,
    /// Sum of compressed object file sizes in bytes
    pub total_size: u64,
}

fn verify_hash(expected: &str, actual: &str) -> Result<()> {
    if !expected.eq_ignore_ascii_case(actual) {
        return Err(GroveError::HashMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn read_dir(path: &Path) -> Result<Vec<fs::DirEntry>> {
    fs::read_dir(path)
        .and_then(|entries| entries.collect::<std::io::Result<Vec<_>>>())
        .map_err(|e| GroveError::io(format!("listing {}", path.display()), e))
}
