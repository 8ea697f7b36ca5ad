//! Main test module for Grove
//!
//! This module includes all test suites:
//! - Integration tests for snapshot and history scenarios
//! - Chaos tests for damaged object files
//! - Property-based tests for invariants

pub mod chaos;
pub mod integration;

#[cfg(test)]
mod edge_cases {
    use ::grove::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_special_filenames() {
        let names = [
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "файл.txt",
            "文件.txt",
            "🚀🌟💾.txt",
        ];

        let blob = Blob::new("content");
        let entries = names
            .iter()
            .map(|name| TreeEntry::new(FileMode::Regular, *name, blob.hash()).unwrap())
            .collect();
        let tree = Tree::new(entries).unwrap();

        let parsed = Tree::parse_content(&tree.content()).unwrap();
        for name in names {
            assert!(parsed.find_entry(name).is_some(), "missing {}", name);
        }
        assert_eq!(parsed.hash(), tree.hash());
    }

    #[test]
    fn test_directory_sorts_after_dotted_file() {
        let hash = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";
        let tree = Tree::new(vec![
            TreeEntry::new(FileMode::Directory, "lib", hash).unwrap(),
            TreeEntry::new(FileMode::Regular, "lib.go", hash).unwrap(),
            TreeEntry::new(FileMode::Regular, "lib-a", hash).unwrap(),
        ])
        .unwrap();

        // '-' (0x2d) < '.' (0x2e) < '/' (0x2f)
        let names: Vec<&str> = tree.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["lib-a", "lib.go", "lib"]);
    }

    #[test]
    fn test_uppercase_hash_normalised() {
        let lower = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";
        let entry = TreeEntry::new(FileMode::Regular, "a", lower.to_uppercase()).unwrap();
        assert_eq!(entry.hash(), lower);
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let hash = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";
        assert!(TreeEntry::new(FileMode::Regular, "", hash).is_err());
        assert!(TreeEntry::new(FileMode::Regular, "nul\0name", hash).is_err());
        assert!(TreeEntry::new(FileMode::Regular, "short", "abc123").is_err());
        assert!(TreeEntry::new(FileMode::Regular, "nothex", "z".repeat(40)).is_err());
        assert!("100664".parse::<FileMode>().is_err());
        assert!(Tree::new(Vec::new()).is_err());
    }

    #[test]
    fn test_large_blob() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path(), GroveConfig::default());

        let content: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        let blob = Blob::new(content);
        let hash = store.store(&blob.clone().into()).unwrap();

        let on_disk = fs::metadata(store.object_path(&hash).unwrap()).unwrap().len();
        assert!(on_disk < blob.size() as u64);
        assert_eq!(store.read_blob(&hash).unwrap(), blob);
    }

    #[test]
    fn test_commit_with_empty_message() {
        let temp_dir = TempDir::new().unwrap();
        let store = ObjectStore::new(temp_dir.path(), GroveConfig::default());

        let commit = Commit::initial(
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391",
            "",
            Author::now("A", "a@example.com"),
        )
        .unwrap();
        let content = String::from_utf8(commit.content()).unwrap();
        assert!(content.ends_with("\n\n"));

        let hash = store.store(&commit.clone().into()).unwrap();
        assert_eq!(store.read_commit(&hash).unwrap().message(), "");
    }

    #[test]
    fn test_unknown_commit_headers_ignored() {
        let content = "tree abc\n\
                       gpgsig something\n\
                       author A <a@b.c> 0 +0000\n\
                       committer A <a@b.c> 0 +0000\n\nmsg\n";
        let commit = Commit::parse_content(content.as_bytes()).unwrap();
        assert_eq!(commit.tree_hash(), "abc");

        // The canonical form drops the unknown line, so the hash changes
        let canonical = String::from_utf8(commit.content()).unwrap();
        assert!(!canonical.contains("gpgsig"));
    }

    #[test]
    fn test_shared_store_between_handles() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ObjectStore::new(temp_dir.path(), GroveConfig::default());
        let reader = ObjectStore::new(temp_dir.path(), GroveConfig::default());

        let hash = writer.store(&Blob::new("shared").into()).unwrap();
        assert!(reader.exists(&hash));
        assert_eq!(reader.read_blob(&hash).unwrap().content(), b"shared");
    }

    #[test]
    fn test_concurrent_writers_same_object() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let root = root.clone();
                std::thread::spawn(move || {
                    let store = ObjectStore::new(root, GroveConfig::default());
                    store.store(&Blob::new("raced").into()).unwrap()
                })
            })
            .collect();

        let hashes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));

        let store = ObjectStore::new(&root, GroveConfig::default());
        assert_eq!(store.list_objects().unwrap(), vec![hashes[0].clone()]);
        assert_eq!(store.read_blob(&hashes[0]).unwrap().content(), b"raced");
    }
}
