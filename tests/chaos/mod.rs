//! Chaos tests for Grove
//!
//! Damages stored object files in random ways and checks that reads either
//! return exactly what was stored or fail with an error. A read must never
//! hand back different content under the requested hash.

use ::grove::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};

/// Chaos testing framework
pub struct StoreChaosTest {
    pub temp_dir: TempDir,
    pub repo: Repository,
    pub chaos_engine: ChaosEngine,
    pub originals: HashMap<String, Object>,
}

impl StoreChaosTest {
    pub fn new(seed: u64) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let repo = RepositoryBuilder::new()
            .compression(CompressionLevel::Fast)
            .init(temp_dir.path())
            .unwrap();

        Self {
            temp_dir,
            repo,
            chaos_engine: ChaosEngine::new(seed),
            originals: HashMap::new(),
        }
    }

    /// Store a mix of blobs, trees and commits
    pub fn populate(&mut self, count: usize) {
        let store = self.repo.objects().clone();
        let author = Author::now("Chaos", "chaos@example.com");
        let mut parent: Option<String> = None;

        for i in 0..count {
            let content = self.chaos_engine.random_bytes(1..2048);
            let blob = Blob::new(content);
            let tree = Tree::new(vec![
                TreeEntry::new(FileMode::Regular, format!("file_{}.bin", i), blob.hash()).unwrap(),
            ])
            .unwrap();
            let commit = Commit::new(tree.hash(), parent.clone(), format!("commit {}", i), author.clone()).unwrap();
            parent = Some(commit.hash().to_string());

            for object in [Object::from(blob), Object::from(tree), Object::from(commit)] {
                let hash = store.store(&object).unwrap();
                self.originals.insert(hash, object);
            }
        }
        info!("Populated {} objects", self.originals.len());
    }

    /// Apply `damage` to `count` random object files and check every read
    pub fn run(&mut self, count: usize, damage: Damage) -> ChaosReport {
        let mut report = ChaosReport::default();
        let store = self.repo.objects().clone();

        let mut hashes: Vec<String> = self.originals.keys().cloned().collect();
        hashes.sort();
        let mut damaged = Vec::new();
        for _ in 0..count.min(hashes.len()) {
            let idx = self.chaos_engine.rng.random_range(0..hashes.len());
            let hash = hashes.remove(idx);
            let path = store.object_path(&hash).unwrap();
            if self.chaos_engine.damage(&path, damage) {
                damaged.push(hash);
            }
        }
        report.files_damaged = damaged.len();

        for hash in &damaged {
            let original = &self.originals[hash];
            match store.read_object(hash) {
                Ok(object) if &object == original => report.reads_unaffected += 1,
                Ok(_) => {
                    warn!("Read of {} returned different content", hash);
                    report.silent_corruptions += 1;
                }
                Err(e) => {
                    info!("Detected damage in {}: {}", hash, e);
                    report.corruption_detected += 1;
                }
            }
        }

        // Untouched objects still read back intact
        for hash in hashes {
            if store.read_object(&hash).ok().as_ref() != Some(&self.originals[&hash]) {
                report.collateral_failures += 1;
            }
        }

        report
    }
}

/// Kinds of damage applied to an object file
#[derive(Debug, Clone, Copy)]
pub enum Damage {
    /// Overwrite random bytes
    FlipBytes,
    /// Cut the file short
    Truncate,
    /// Replace the file with zero bytes
    Empty,
    /// Replace the file with a valid stream of some other object
    Swap,
}

/// Source of randomness and file damage
pub struct ChaosEngine {
    pub rng: StdRng,
}

impl ChaosEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn random_bytes(&mut self, size_range: std::ops::Range<usize>) -> Vec<u8> {
        let size = self.rng.random_range(size_range);
        let mut content = vec![0u8; size];
        self.rng.fill(&mut content[..]);
        content
    }

    /// Damage the file at `path`; returns whether it changed
    pub fn damage(&mut self, path: &Path, damage: Damage) -> bool {
        let Ok(mut content) = fs::read(path) else {
            return false;
        };
        let before = content.clone();

        match damage {
            Damage::FlipBytes => {
                for _ in 0..10 {
                    let idx = self.rng.random_range(0..content.len());
                    content[idx] ^= self.rng.random_range(1..=255u8);
                }
            }
            Damage::Truncate => {
                let keep = self.rng.random_range(0..content.len());
                content.truncate(keep);
            }
            Damage::Empty => content.clear(),
            Damage::Swap => {
                let other = Blob::new(self.random_bytes(1..64));
                content = CompressionEngine::default().compress(&other.data()).unwrap();
            }
        }

        content != before && fs::write(path, content).is_ok()
    }
}

/// Outcome of a chaos run
#[derive(Debug, Default)]
pub struct ChaosReport {
    pub files_damaged: usize,
    pub corruption_detected: usize,
    pub reads_unaffected: usize,
    pub silent_corruptions: usize,
    pub collateral_failures: usize,
}

impl ChaosReport {
    pub fn test_passed(&self) -> bool {
        self.silent_corruptions == 0 && self.collateral_failures == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_flipped_bytes_detected() {
        let mut chaos_test = StoreChaosTest::new(7);
        chaos_test.populate(10);

        let report = chaos_test.run(10, Damage::FlipBytes);
        assert!(report.corruption_detected > 0, "Should detect corruption");
        assert!(report.test_passed(), "{:?}", report);
    }

    #[test]
    #[traced_test]
    fn test_truncated_files_detected() {
        let mut chaos_test = StoreChaosTest::new(11);
        chaos_test.populate(10);

        let report = chaos_test.run(10, Damage::Truncate);
        assert_eq!(report.corruption_detected, report.files_damaged);
        assert!(report.test_passed(), "{:?}", report);
    }

    #[test]
    fn test_emptied_files_detected() {
        let mut chaos_test = StoreChaosTest::new(13);
        chaos_test.populate(5);

        let report = chaos_test.run(5, Damage::Empty);
        assert_eq!(report.corruption_detected, report.files_damaged);
        assert!(report.test_passed(), "{:?}", report);
    }

    #[test]
    fn test_swapped_objects_detected() {
        let mut chaos_test = StoreChaosTest::new(17);
        chaos_test.populate(5);

        let report = chaos_test.run(8, Damage::Swap);
        assert_eq!(report.corruption_detected, report.files_damaged);
        assert!(report.test_passed(), "{:?}", report);
    }

    #[test]
    fn test_swapped_blob_reports_hash_mismatch() {
        let mut chaos_test = StoreChaosTest::new(19);
        let store = chaos_test.repo.objects().clone();
        let hash = store.store(&Blob::new("genuine").into()).unwrap();

        let path = store.object_path(&hash).unwrap();
        assert!(chaos_test.chaos_engine.damage(&path, Damage::Swap));
        assert!(matches!(
            store.read_blob(&hash),
            Err(GroveError::HashMismatch { .. })
        ));
    }
}
