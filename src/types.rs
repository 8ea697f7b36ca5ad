//! Configuration shared by the object store and the repository layer
//!
//! All paths and permission bits that describe the on-disk layout live in a
//! single [`GroveConfig`] value that callers pass into constructors. Nothing
//! here is process-wide state.
//!
//! ## Examples
//!
//! ```rust
//! use grove::types::GroveConfig;
//! use grove::compression::CompressionLevel;
//!
//! let config = GroveConfig {
//!     compression: CompressionLevel::Best,
//!     ..Default::default()
//! };
//! assert_eq!(config.metadata_dir, ".grove");
//! ```

use crate::compression::CompressionLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the repository metadata directory
pub const DEFAULT_METADATA_DIR: &str = ".grove";

/// Layout and storage settings for a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroveConfig {
    /// Metadata directory relative to the repository root
    pub metadata_dir: String,
    /// Object directory relative to the metadata directory
    pub objects_dir: String,
    /// Reference directory relative to the metadata directory
    pub refs_dir: String,
    /// Branch `HEAD` points at after `init`
    pub default_branch: String,
    /// Permission bits for created directories (Unix only)
    pub dir_mode: u32,
    /// Permission bits for created files (Unix only)
    pub file_mode: u32,
    /// zlib level used when writing objects
    pub compression: CompressionLevel,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            metadata_dir: DEFAULT_METADATA_DIR.to_string(),
            objects_dir: "objects".to_string(),
            refs_dir: "refs".to_string(),
            default_branch: "main".to_string(),
            dir_mode: 0o755,
            file_mode: 0o644,
            compression: CompressionLevel::Default,
        }
    }
}

/// Contents of `<metadata_dir>/config.json`
///
/// Written once by `init` so that later `open` calls reuse the settings the
/// repository was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// On-disk format version
    pub format_version: u32,
    /// Version of grove that created the repository
    pub grove_version: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Settings in effect for this repository
    pub config: GroveConfig,
}

impl RepositoryMetadata {
    /// Current on-disk format version
    pub const FORMAT_VERSION: u32 = 1;

    /// Metadata for a repository created now with `config`
    pub fn new(config: GroveConfig) -> Self {
        Self {
            format_version: Self::FORMAT_VERSION,
            grove_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            config,
        }
    }
}
