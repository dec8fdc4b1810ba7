//! End-to-end tests of the dirhash binary

use crate::integration::test_utils::{create_small_tree, mkfile};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with a clean environment: no user config, no ignore override, no logging.
fn dirhash_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dirhash").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("DIRHASH_IGNORE")
        .env_remove("DIRHASH_LOG")
        .env_remove("DIRHASH_LOG_FORMAT")
        .env_remove("DIRHASH_DEFAULTS__ALGORITHM")
        .env_remove("DIRHASH_DEFAULTS__JOBS");
    cmd
}

#[test]
fn test_prints_digest() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());

    dirhash_cmd(&home)
        .arg(tree.path())
        .assert()
        .success()
        .stdout("ce1f2e32ab76b7908213f221a5750bc8\n");

    dirhash_cmd(&home)
        .arg(tree.path())
        .args(["-a", "sha256", "-j", "4"])
        .assert()
        .success()
        .stdout("07630bb95ad5caeaa8162b6f21df236c5008eed4ca26bc151611b9ccd9ca4b16\n");
}

#[test]
fn test_content_and_path_shortcuts() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());

    dirhash_cmd(&home)
        .arg(tree.path())
        .arg("--content-only")
        .assert()
        .success()
        .stdout("866da9045ff6e57f72e7180511f3039b\n");

    dirhash_cmd(&home)
        .arg(tree.path())
        .arg("--paths-only")
        .assert()
        .success()
        .stdout("a382452611957ab0efbd4866b706b6cf\n");

    dirhash_cmd(&home)
        .arg(tree.path())
        .args(["-p", "data"])
        .assert()
        .success()
        .stdout("866da9045ff6e57f72e7180511f3039b\n");
}

#[test]
fn test_list_mode() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());
    mkfile(tree.path(), "skip.log", "noise");

    dirhash_cmd(&home)
        .arg(tree.path())
        .args(["--list", "-x", "log"])
        .assert()
        .success()
        .stdout("d1/f1\nf1\n");
}

#[test]
fn test_errors_exit_with_single_line() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());

    dirhash_cmd(&home)
        .arg(tree.path().join("missing"))
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("dirhash: ").and(predicate::str::contains("Not a directory")));

    dirhash_cmd(&home)
        .arg(tree.path())
        .args(["-a", "md4"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown algorithm"));

    let empty = TempDir::new().unwrap();
    dirhash_cmd(&home)
        .arg(empty.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to hash"));
}

#[test]
fn test_missing_ignore_override() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());
    let missing = home.path().join("nowhere.ignore");

    dirhash_cmd(&home)
        .env("DIRHASH_IGNORE", &missing)
        .arg(tree.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "DIRHASH_IGNORE={}: No such file",
            missing.display()
        )));

    dirhash_cmd(&home)
        .env("DIRHASH_IGNORE", &missing)
        .arg(tree.path())
        .arg("--no-ignore-file")
        .assert()
        .success();
}

#[test]
fn test_ignore_override_file() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());
    mkfile(tree.path(), "extra.tmp", "scratch");
    let ignore = home.path().join("custom.ignore");
    std::fs::write(&ignore, "*.tmp\n").unwrap();

    dirhash_cmd(&home)
        .env("DIRHASH_IGNORE", &ignore)
        .arg(tree.path())
        .assert()
        .success()
        .stdout("ce1f2e32ab76b7908213f221a5750bc8\n");
}

#[test]
fn test_config_file_defaults() {
    let home = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    create_small_tree(tree.path());
    let config = home.path().join("dirhash.toml");
    std::fs::write(&config, "[defaults]\nalgorithm = \"sha1\"\n").unwrap();

    dirhash_cmd(&home)
        .arg(tree.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout("34b655ba3f2dd9b07fda9932012906957ec985c0\n");

    // Command-line flags win over the file.
    dirhash_cmd(&home)
        .arg(tree.path())
        .arg("--config")
        .arg(&config)
        .args(["-a", "md5"])
        .assert()
        .success()
        .stdout("ce1f2e32ab76b7908213f221a5750bc8\n");
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    dirhash_cmd(&home)
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dirhash "));
}
