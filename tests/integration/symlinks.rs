//! Symbolic link handling: aliasing, link policies and cycles

#![cfg(unix)]

use crate::integration::test_utils::{mkdirs, mkfile, options, options_with_properties, symlink, CountingFactory};
use dirhash::{dirhash, included_paths, DirHashEngine, DirhashError, DirhashOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn cyclic_options() -> DirhashOptions {
    DirhashOptions {
        allow_cyclic_links: true,
        ..options("md5")
    }
}

#[test]
fn test_cycle_raises_with_both_occurrences() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    mkdirs(&root, "d1");
    symlink(&root, &root.join("d1/link_back"));

    let err = dirhash(&root, &options("md5")).unwrap_err();
    assert!(!err.is_argument_error());
    let message = err.to_string();
    assert!(message.contains(&root.display().to_string()));
    assert!(message.contains(&root.join("d1/link_back").display().to_string()));

    match err {
        DirhashError::SymlinkRecursion {
            first_path,
            second_path,
            ..
        } => {
            assert_eq!(first_path.components().collect::<Vec<_>>(), root.components().collect::<Vec<_>>());
            assert_eq!(second_path, root.join("d1/link_back"));
        }
        other => panic!("expected SymlinkRecursion, got {:?}", other),
    }

    // Listing walks the same tree and fails the same way.
    assert!(matches!(
        included_paths(&root, &options("md5")),
        Err(DirhashError::SymlinkRecursion { .. })
    ));
}

/// `target` expressed relative to the current directory, through `..` hops to `/`.
fn relative_to_cwd(target: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap();
    let mut relative = PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.join(target.strip_prefix("/").unwrap())
}

#[test]
fn test_cycle_error_paths_are_absolute_for_relative_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    mkdirs(&root, "d1");
    symlink(&root, &root.join("d1/link_back"));

    let relative = relative_to_cwd(&root);
    assert!(relative.is_relative());

    match dirhash(&relative, &options("md5")).unwrap_err() {
        DirhashError::SymlinkRecursion {
            first_path,
            second_path,
            ..
        } => {
            assert!(first_path.is_absolute(), "{}", first_path.display());
            assert!(second_path.is_absolute(), "{}", second_path.display());
            assert!(second_path.ends_with("d1/link_back"));
        }
        other => panic!("expected SymlinkRecursion, got {:?}", other),
    }
}

#[test]
fn test_allowed_cycle_is_hashed_as_reference() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    mkdirs(&root, "d1");
    symlink(&root, &root.join("d1/link_back"));

    assert_eq!(
        dirhash(&root, &cyclic_options()).unwrap(),
        "1eea68dd49fbd27314758d353b9d3f0e"
    );
    assert_eq!(included_paths(&root, &cyclic_options()).unwrap(), ["d1/link_back/."]);

    let parallel = DirhashOptions {
        jobs: 4,
        ..cyclic_options()
    };
    assert_eq!(
        dirhash(&root, &parallel).unwrap(),
        "1eea68dd49fbd27314758d353b9d3f0e"
    );
}

#[test]
fn test_cycle_digest_independent_of_location() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("elsewhere/second");
    for root in [&first, &second] {
        mkfile(root, "a/b/file", "payload");
        symlink(&root.join("a"), &root.join("a/b/up"));
    }

    assert_eq!(
        dirhash(&first, &cyclic_options()).unwrap(),
        dirhash(&second, &cyclic_options()).unwrap()
    );
}

#[test]
fn test_cycle_target_changes_digest() {
    let temp_dir = TempDir::new().unwrap();
    let to_root = temp_dir.path().join("to_root");
    let to_parent = temp_dir.path().join("to_parent");
    for root in [&to_root, &to_parent] {
        mkfile(root, "a/b/file", "payload");
    }
    symlink(&to_root, &to_root.join("a/b/up"));
    symlink(&to_parent.join("a"), &to_parent.join("a/b/up"));

    assert_ne!(
        dirhash(&to_root, &cyclic_options()).unwrap(),
        dirhash(&to_parent, &cyclic_options()).unwrap()
    );
}

#[test]
fn test_aliased_file_is_hashed_once() {
    let temp_dir = TempDir::new().unwrap();
    let external = temp_dir.path().join("external");
    mkfile(temp_dir.path(), "external", "shared external content");
    let root = temp_dir.path().join("root");
    mkdirs(&root, "sub");
    for link in ["f1", "f2", "sub/f3", "sub/f4"] {
        symlink(&external, &root.join(link));
    }

    for jobs in [1, 4] {
        let opts = DirhashOptions {
            jobs,
            ..options("md5")
        };
        let counting = Arc::new(CountingFactory::new(b"shared external content"));
        let engine = DirHashEngine::with_factory(counting.clone(), opts.filter(&root).unwrap(), opts.protocol().unwrap())
            .with_jobs(jobs);

        assert_eq!(engine.compute(&root).unwrap(), dirhash(&root, &opts).unwrap());
        assert_eq!(counting.hits(), 1, "jobs {}", jobs);
    }
}

#[test]
fn test_unfollowed_links_are_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    mkfile(&root, "real/f", "x");
    mkfile(&root, "plain", "y");
    symlink(&root.join("real"), &root.join("linked_dir"));
    symlink(&root.join("plain"), &root.join("linked_file"));

    assert_eq!(
        included_paths(&root, &options("md5")).unwrap(),
        ["linked_dir/f", "linked_file", "plain", "real/f"]
    );

    let no_dirs = DirhashOptions {
        linked_dirs: false,
        ..options("md5")
    };
    assert_eq!(
        included_paths(&root, &no_dirs).unwrap(),
        ["linked_file", "plain", "real/f"]
    );

    let no_files = DirhashOptions {
        linked_files: false,
        ..options("md5")
    };
    assert_eq!(
        included_paths(&root, &no_files).unwrap(),
        ["linked_dir/f", "plain", "real/f"]
    );
}

#[test]
fn test_is_link_property_distinguishes_links_from_copies() {
    let temp_dir = TempDir::new().unwrap();
    let copied = temp_dir.path().join("copied");
    let linked = temp_dir.path().join("linked");
    mkfile(&copied, "f", "same");
    mkfile(&copied, "g", "same");
    mkfile(&linked, "f", "same");
    symlink(&linked.join("f"), &linked.join("g"));

    let plain = options_with_properties("md5", &["name", "data"]);
    assert_eq!(dirhash(&copied, &plain).unwrap(), dirhash(&linked, &plain).unwrap());

    let with_link = options_with_properties("md5", &["name", "data", "is_link"]);
    assert_ne!(dirhash(&copied, &with_link).unwrap(), dirhash(&linked, &with_link).unwrap());
}

#[test]
fn test_pinned_digest_for_linked_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    mkfile(temp_dir.path(), "external", "a");
    mkdirs(&root, "");
    symlink(&temp_dir.path().join("external"), &root.join("f1"));

    let opts = options_with_properties("md5", &["name", "data", "is_link"]);
    assert_eq!(dirhash(&root, &opts).unwrap(), "dff4feab28108cbdb2369bd0a2991ce4");
}

#[test]
fn test_sibling_links_to_same_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("root");
    let target = temp_dir.path().join("target");
    mkfile(&target, "f", "shared");
    mkdirs(&root, "x");
    symlink(&target, &root.join("a"));
    symlink(&target, &root.join("x/b"));

    assert_eq!(included_paths(&root, &options("md5")).unwrap(), ["a/f", "x/b/f"]);
    assert!(dirhash(&root, &options("md5")).is_ok());
}
