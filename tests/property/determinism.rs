//! Property-based tests for determinism guarantees

use dirhash::{dirhash, included_paths, DirhashOptions};
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

type Layout = BTreeMap<String, (bool, Vec<u8>)>;

fn layout_strategy() -> impl Strategy<Value = Layout> {
    prop::collection::btree_map(
        "[a-z]{1,6}",
        (any::<bool>(), prop::collection::vec(any::<u8>(), 0..64)),
        1..12,
    )
}

fn relative(name: &str, nested: bool) -> String {
    if nested {
        format!("dir_0/{}", name)
    } else {
        name.to_string()
    }
}

fn materialize<'a>(root: &Path, entries: impl Iterator<Item = (&'a String, &'a (bool, Vec<u8>))>) {
    fs::create_dir_all(root).unwrap();
    for (name, (nested, content)) in entries {
        let path = root.join(relative(name, *nested));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn options(jobs: usize) -> DirhashOptions {
    DirhashOptions {
        jobs,
        use_ignore_file: false,
        ..DirhashOptions::default()
    }
}

/// Creation order and worker count never change the digest
#[test]
fn test_digest_determinism_property() {
    let mut runner = TestRunner::new(Config::with_cases(32));

    runner
        .run(&layout_strategy(), |layout| {
            let temp_dir = TempDir::new().unwrap();
            let forward = temp_dir.path().join("forward");
            let reverse = temp_dir.path().join("reverse");
            materialize(&forward, layout.iter());
            materialize(&reverse, layout.iter().rev());

            let expected = dirhash(&forward, &options(1)).unwrap();
            prop_assert_eq!(&dirhash(&reverse, &options(1)).unwrap(), &expected);
            prop_assert_eq!(&dirhash(&forward, &options(4)).unwrap(), &expected);
            prop_assert_eq!(&dirhash(&reverse, &options(4)).unwrap(), &expected);
            prop_assert_eq!(&dirhash(&forward, &options(8)).unwrap(), &expected);
            Ok(())
        })
        .unwrap();
}

/// The listing names exactly the files that were written
#[test]
fn test_listing_property() {
    let mut runner = TestRunner::new(Config::with_cases(32));

    runner
        .run(&layout_strategy(), |layout| {
            let temp_dir = TempDir::new().unwrap();
            materialize(temp_dir.path(), layout.iter());

            let mut expected: Vec<String> = layout
                .iter()
                .map(|(name, (nested, _))| relative(name, *nested))
                .collect();
            expected.sort();
            prop_assert_eq!(included_paths(temp_dir.path(), &options(1)).unwrap(), expected);
            Ok(())
        })
        .unwrap();
}

/// Changing one file's content changes the digest
#[test]
fn test_content_sensitivity_property() {
    let mut runner = TestRunner::new(Config::with_cases(32));

    runner
        .run(&(layout_strategy(), any::<prop::sample::Index>()), |(layout, index)| {
            let temp_dir = TempDir::new().unwrap();
            materialize(temp_dir.path(), layout.iter());
            let before = dirhash(temp_dir.path(), &options(1)).unwrap();

            let (name, (nested, content)) = layout.iter().nth(index.index(layout.len())).unwrap();
            let mut changed = content.clone();
            changed.push(0xff);
            fs::write(temp_dir.path().join(relative(name, *nested)), changed).unwrap();

            prop_assert_ne!(dirhash(temp_dir.path(), &options(1)).unwrap(), before);
            Ok(())
        })
        .unwrap();
}
