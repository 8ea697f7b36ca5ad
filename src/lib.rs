//! # Grove - a content-addressed object store
//!
//! Grove stores file contents, directory snapshots and history records as
//! immutable objects named by the SHA-1 of their bytes, using the same wire
//! format as Git's loose objects.
//!
//! ## Overview
//!
//! - **Blobs** hold raw file bytes
//! - **Trees** hold sorted, named references to blobs and other trees
//! - **Commits** link a tree to its author, a message and an optional parent
//!
//! Every object serializes to `"<type> <len>\0<content>"`. The hash of that
//! byte string is the object's identity, and the zlib-compressed bytes are
//! stored at `.grove/objects/<first 2 hex>/<remaining 38 hex>`.
//!
//! ## Architecture
//!
//! - **Object model** ([`object`]): constructors validate and canonicalise,
//!   so two objects with equal fields always have equal hashes
//! - **Object store** ([`storage`]): idempotent atomic writes, and reads that
//!   recompute the hash of whatever they parsed
//! - **Repository** ([`repository`]): creates and locates `.grove` directories
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grove::{Author, Blob, Commit, FileMode, GroveConfig, Repository, Tree, TreeEntry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::init("./my_project", GroveConfig::default())?;
//! let store = repo.objects();
//!
//! let readme = Blob::new(b"# My project\n".to_vec());
//! store.store(&readme.clone().into())?;
//!
//! let tree = Tree::new(vec![TreeEntry::new(FileMode::Regular, "README.md", readme.hash())?])?;
//! let tree_hash = store.store(&tree.into())?;
//!
//! let author = Author::now("Jane Doe", "jane@example.com");
//! let commit = Commit::initial(tree_hash, "Initial commit", author)?;
//! let commit_hash = store.store(&commit.into())?;
//!
//! let loaded = store.read_commit(&commit_hash)?;
//! println!("{} -> tree {}", commit_hash, loaded.tree_hash());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, GroveError>`](GroveError).
//! Nothing is retried or recovered silently; storing an object that already
//! exists is the only "soft success".

pub mod compression;
pub mod error;
pub mod hash;
pub mod object;
pub mod repository;
pub mod storage;
pub mod types;

mod utils;

pub use compression::{CompressionEngine, CompressionLevel};
pub use error::{GroveError, Result};
pub use hash::{compute_hash, compute_hash_for, is_valid_hash, ObjectType};
pub use object::{Author, Blob, Commit, FileMode, Object, Tree, TreeEntry};
pub use repository::{Repository, RepositoryBuilder};
pub use storage::{ObjectStore, StorageStats};
pub use types::*;
