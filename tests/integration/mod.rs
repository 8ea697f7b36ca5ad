//! Integration tests for Grove
//!
//! Builds generated project directories into nested trees and commit
//! chains, then reads everything back through the store.

use ::grove::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// Test harness for snapshot and history scenarios
pub struct StoreTestHarness {
    pub temp_dir: TempDir,
    pub repo: Repository,
    pub file_generator: FileGenerator,
    pub history: Vec<String>,
}

impl StoreTestHarness {
    /// Create a harness around a fresh repository
    pub fn new() -> Self {
        Self::with_config(GroveConfig::default())
    }

    pub fn with_config(config: GroveConfig) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path(), config).unwrap();

        Self {
            temp_dir,
            repo,
            file_generator: FileGenerator::new(42),
            history: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Generate a directory tree of text and binary files
    pub fn generate_project(&mut self, config: &ProjectConfig) -> Vec<PathBuf> {
        let root = self.root().to_path_buf();
        let mut files = Vec::new();
        self.generate_level(&root, config, 0, &mut files);
        info!("Generated {} files", files.len());
        files
    }

    fn generate_level(&mut self, dir: &Path, config: &ProjectConfig, depth: usize, files: &mut Vec<PathBuf>) {
        fs::create_dir_all(dir).unwrap();

        for i in 0..config.files_per_dir {
            let path = dir.join(format!("file_{}.txt", i));
            let content = if i % 3 == 0 {
                self.file_generator.generate_binary_content(config.file_size_range.end / 4)
            } else {
                self.file_generator.generate_file_content(config.file_size_range.clone())
            };
            fs::write(&path, content).unwrap();
            files.push(path);
        }

        if depth < config.max_depth {
            for i in 0..config.dirs_per_level {
                let sub = dir.join(format!("dir_{}", i));
                self.generate_level(&sub, config, depth + 1, files);
            }
        }
    }

    /// Store the working directory as blobs and trees, returning the root tree hash
    pub fn snapshot(&self) -> String {
        snapshot_dir(self.repo.objects(), self.root())
    }

    /// Snapshot and commit on top of the current history
    pub fn commit(&mut self, message: &str) -> String {
        let tree = self.snapshot();
        let parent = self.history.last().cloned();
        let commit = Commit::new(tree, parent, message, Author::now("Harness", "harness@example.com")).unwrap();
        let hash = self.repo.objects().store(&commit.into()).unwrap();
        self.history.push(hash.clone());
        hash
    }

    /// Read a tree back into a `path -> content` map
    pub fn materialize(&self, tree_hash: &str) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        self.materialize_into(tree_hash, PathBuf::new(), &mut files);
        files
    }

    fn materialize_into(&self, tree_hash: &str, prefix: PathBuf, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
        let store = self.repo.objects();
        let tree = store.read_tree(tree_hash).unwrap();
        for entry in tree.entries() {
            let path = prefix.join(entry.name());
            if entry.is_directory() {
                self.materialize_into(entry.hash(), path, files);
            } else {
                files.insert(path, store.read_blob(entry.hash()).unwrap().into_content());
            }
        }
    }

    /// Current working directory as a `path -> content` map
    pub fn working_files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect_files(self.root(), self.root(), &mut files);
        files
    }
}

fn snapshot_dir(store: &ObjectStore, dir: &Path) -> String {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        if name == DEFAULT_METADATA_DIR {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            let hash = snapshot_dir(store, &path);
            entries.push(TreeEntry::new(FileMode::Directory, name, hash).unwrap());
        } else {
            let hash = store.store(&Blob::from_file(&path).unwrap().into()).unwrap();
            entries.push(TreeEntry::new(FileMode::Regular, name, hash).unwrap());
        }
    }
    store.store(&Tree::new(entries).unwrap().into()).unwrap()
}

fn collect_files(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        if entry.file_name() == DEFAULT_METADATA_DIR {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(relative, fs::read(&path).unwrap());
        }
    }
}

/// File generator for test data
pub struct FileGenerator {
    rng: StdRng,
}

impl FileGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate word-like text content
    pub fn generate_file_content(&mut self, size_range: std::ops::Range<usize>) -> Vec<u8> {
        let size = self.rng.random_range(size_range);
        let mut content = Vec::with_capacity(size);

        let words = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "lorem", "ipsum"];
        while content.len() < size {
            let word = words[self.rng.random_range(0..words.len())];
            content.extend_from_slice(word.as_bytes());
            content.push(b' ');
        }

        content.truncate(size);
        content
    }

    /// Generate binary file content
    pub fn generate_binary_content(&mut self, size: usize) -> Vec<u8> {
        let mut content = vec![0u8; size];
        self.rng.fill(&mut content[..]);
        content
    }
}

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub max_depth: usize,
    pub dirs_per_level: usize,
    pub files_per_dir: usize,
    pub file_size_range: std::ops::Range<usize>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            dirs_per_level: 3,
            files_per_dir: 4,
            file_size_range: 1..4_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_snapshot_roundtrip() {
        let mut harness = StoreTestHarness::new();
        harness.generate_project(&ProjectConfig::default());

        let tree = harness.snapshot();
        assert_eq!(harness.materialize(&tree), harness.working_files());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let mut harness = StoreTestHarness::new();
        harness.generate_project(&ProjectConfig::default());

        let first = harness.snapshot();
        let objects = harness.repo.objects().list_objects().unwrap();
        let second = harness.snapshot();

        assert_eq!(first, second);
        assert_eq!(harness.repo.objects().list_objects().unwrap(), objects);
    }

    #[test]
    fn test_commit_chain() {
        let mut harness = StoreTestHarness::new();
        let config = ProjectConfig {
            max_depth: 1,
            ..Default::default()
        };
        harness.generate_project(&config);

        let mut snapshots = Vec::new();
        for round in 0..5 {
            let path = harness.root().join(format!("round_{}.txt", round));
            fs::write(&path, format!("round {}", round)).unwrap();
            harness.commit(&format!("Round {}", round));
            snapshots.push(harness.working_files());
        }

        // Walk back from the tip, checking every snapshot
        let store = harness.repo.objects();
        let mut current = harness.history.last().cloned();
        let mut walked = 0;
        while let Some(hash) = current {
            let commit = store.read_commit(&hash).unwrap();
            let index = snapshots.len() - 1 - walked;
            assert_eq!(commit.message(), format!("Round {}", index));
            assert_eq!(harness.materialize(commit.tree_hash()), snapshots[index]);
            current = commit.parent_hash().map(str::to_string);
            walked += 1;
        }
        assert_eq!(walked, 5);
    }

    #[test]
    fn test_identical_subtrees_share_hash() {
        let harness = StoreTestHarness::new();
        for dir in ["left", "right"] {
            let path = harness.root().join(dir);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("same.txt"), "identical").unwrap();
        }

        let root = harness.repo.objects().read_tree(&harness.snapshot()).unwrap();
        let left = root.find_entry("left").unwrap();
        let right = root.find_entry("right").unwrap();
        assert_eq!(left.hash(), right.hash());
    }

    #[test]
    fn test_all_compression_levels_interoperate() {
        let mut hashes = Vec::new();
        for level in [CompressionLevel::Fast, CompressionLevel::Default, CompressionLevel::Best] {
            let harness = StoreTestHarness::with_config(GroveConfig {
                compression: level,
                ..Default::default()
            });
            fs::write(harness.root().join("data.txt"), "level independent").unwrap();
            let tree = harness.snapshot();

            // A store configured differently reads the same files
            let reader = ObjectStore::new(harness.root(), GroveConfig::default());
            assert!(reader.read_tree(&tree).is_ok());
            hashes.push(tree);
        }
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_empty_blob_in_tree() {
        let harness = StoreTestHarness::new();
        fs::write(harness.root().join("empty"), b"").unwrap();

        let tree = harness.repo.objects().read_tree(&harness.snapshot()).unwrap();
        assert_eq!(
            tree.find_entry("empty").unwrap().hash(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
    }
}
