//! Repository bootstrap: creating, opening and locating `.grove` directories
//!
//! A repository is a working directory containing a metadata directory:
//!
//! ```text
//! <root>/
//! └── .grove/
//!     ├── config.json        # RepositoryMetadata
//!     ├── HEAD               # "ref: refs/heads/<default_branch>\n"
//!     ├── objects/           # ObjectStore shards
//!     └── refs/
//!         ├── heads/
//!         └── tags/
//! ```

use crate::compression::CompressionLevel;
use crate::error::{GroveError, Result};
use crate::storage::ObjectStore;
use crate::types::{GroveConfig, RepositoryMetadata};
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "config.json";
const HEAD_FILE: &str = "HEAD";
const HEAD_REF_PREFIX: &str = "ref: ";

/// An initialised repository and its object store
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    metadata_dir: PathBuf,
    config: GroveConfig,
    store: ObjectStore,
}

impl Repository {
    /// Create a new repository at `path`
    ///
    /// `path` is created if missing. On any failure the partially created
    /// metadata directory is removed again.
    ///
    /// # Errors
    ///
    /// - [`GroveError::RepositoryExists`] if the metadata directory already exists
    /// - [`GroveError::Io`] if any directory or file cannot be created
    pub fn init(path: impl AsRef<Path>, config: GroveConfig) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let metadata_dir = root.join(&config.metadata_dir);
        if metadata_dir.exists() {
            return Err(GroveError::RepositoryExists(metadata_dir));
        }

        utils::create_dir_all(&root, config.dir_mode)?;
        utils::create_dir_all(&metadata_dir, config.dir_mode)?;
        let guard = InitGuard::new(&metadata_dir);

        let refs_dir = metadata_dir.join(&config.refs_dir);
        for dir in [
            metadata_dir.join(&config.objects_dir),
            refs_dir.join("heads"),
            refs_dir.join("tags"),
        ] {
            utils::create_dir_all(&dir, config.dir_mode)?;
        }

        let head = format!(
            "{}{}/heads/{}\n",
            HEAD_REF_PREFIX, config.refs_dir, config.default_branch
        );
        utils::atomic_write(&metadata_dir.join(HEAD_FILE), head.as_bytes(), config.file_mode)?;

        let metadata = RepositoryMetadata::new(config.clone());
        let metadata_json = serde_json::to_string_pretty(&metadata)?;
        utils::atomic_write(
            &metadata_dir.join(CONFIG_FILE),
            metadata_json.as_bytes(),
            config.file_mode,
        )?;

        guard.disarm();
        info!("Initialized repository at {:?}", root);

        Ok(Self::from_parts(root, metadata_dir, config))
    }

    /// Open the repository rooted exactly at `path`
    ///
    /// Settings recorded in `config.json` take precedence over `config`,
    /// except for the metadata directory name used to find it.
    ///
    /// # Errors
    ///
    /// - [`GroveError::RepositoryNotFound`] if `path` has no metadata directory
    /// - [`GroveError::Json`] if `config.json` is unreadable as metadata
    pub fn open(path: impl AsRef<Path>, config: GroveConfig) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let metadata_dir = root.join(&config.metadata_dir);
        if !metadata_dir.is_dir() {
            return Err(GroveError::RepositoryNotFound(root));
        }

        let config_path = metadata_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let json = fs::read_to_string(&config_path)
                .map_err(|e| GroveError::io(format!("reading {}", config_path.display()), e))?;
            let metadata: RepositoryMetadata = serde_json::from_str(&json)?;
            debug!(
                "Loaded repository config (format v{}, created by grove {})",
                metadata.format_version, metadata.grove_version
            );
            GroveConfig {
                metadata_dir: config.metadata_dir,
                ..metadata.config
            }
        } else {
            config
        };

        debug!("Opened repository at {:?}", root);
        Ok(Self::from_parts(root, metadata_dir, config))
    }

    /// Open the nearest repository at or above `start`
    ///
    /// # Errors
    ///
    /// - [`GroveError::RepositoryNotFound`] if no ancestor holds a metadata directory
    pub fn discover(start: impl AsRef<Path>, config: GroveConfig) -> Result<Self> {
        let start = start.as_ref();
        let start = fs::canonicalize(start)
            .map_err(|e| GroveError::io(format!("resolving {}", start.display()), e))?;

        for dir in start.ancestors() {
            if dir.join(&config.metadata_dir).is_dir() {
                return Self::open(dir, config);
            }
        }
        Err(GroveError::RepositoryNotFound(start))
    }

    fn from_parts(root: PathBuf, metadata_dir: PathBuf, config: GroveConfig) -> Self {
        let store = ObjectStore::new(&root, config.clone());
        Self {
            root,
            metadata_dir,
            config,
            store,
        }
    }

    /// Working directory root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.grove` directory
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Settings in effect
    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    /// Object store for this repository
    pub fn objects(&self) -> &ObjectStore {
        &self.store
    }

    /// Reference `HEAD` points at, e.g. `refs/heads/main`
    pub fn head_ref(&self) -> Result<String> {
        let path = self.metadata_dir.join(HEAD_FILE);
        let head = fs::read_to_string(&path)
            .map_err(|e| GroveError::io(format!("reading {}", path.display()), e))?;
        head.trim_end()
            .strip_prefix(HEAD_REF_PREFIX)
            .map(str::to_string)
            .ok_or_else(|| GroveError::format(format!("HEAD is not a symbolic ref: {:?}", head)))
    }
}

/// Removes a half-initialised metadata directory unless disarmed
struct InitGuard {
    path: PathBuf,
    armed: bool,
}

impl InitGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to clean up {:?} after failed init: {}", self.path, e);
            }
        }
    }
}

/// Builder for repositories with custom settings
///
/// # Examples
///
/// ```rust,no_run
/// use grove::{CompressionLevel, RepositoryBuilder};
///
/// # fn example() -> grove::Result<()> {
/// let repo = RepositoryBuilder::new()
///     .compression(CompressionLevel::Best)
///     .default_branch("trunk")
///     .init("./project")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryBuilder {
    config: GroveConfig,
}

impl RepositoryBuilder {
    /// Start from the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the metadata directory (default `.grove`)
    pub fn metadata_dir(mut self, name: impl Into<String>) -> Self {
        self.config.metadata_dir = name.into();
        self
    }

    /// Branch `HEAD` points at after init (default `main`)
    pub fn default_branch(mut self, branch: impl Into<String>) -> Self {
        self.config.default_branch = branch.into();
        self
    }

    /// zlib level for new objects
    pub fn compression(mut self, level: CompressionLevel) -> Self {
        self.config.compression = level;
        self
    }

    /// Permission bits for created directories (Unix only)
    pub fn dir_mode(mut self, mode: u32) -> Self {
        self.config.dir_mode = mode;
        self
    }

    /// Permission bits for created files (Unix only)
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Settings accumulated so far
    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn init(self, path: impl AsRef<Path>) -> Result<Repository> {
        Repository::init(path, self.config)
    }

    pub fn open(self, path: impl AsRef<Path>) -> Result<Repository> {
        Repository::open(path, self.config)
    }

    pub fn discover(self, start: impl AsRef<Path>) -> Result<Repository> {
        Repository::discover(start, self.config)
    }
}
