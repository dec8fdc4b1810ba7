//! Ignore-file convention.
//!
//! A `.dirhashignore` file directly under the hashed directory lists extra
//! ignore patterns, one per line; blank lines and `#` comments are skipped.
//! When the directory has no such file, `DIRHASH_IGNORE` may name an ignore
//! file elsewhere, which must then exist. The ignore file itself is hashed
//! like any other file unless a pattern excludes it.

use crate::error::{DirhashError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the ignore file looked up under the root
pub const IGNORE_FILE_NAME: &str = ".dirhashignore";

/// Environment variable naming an ignore file outside the root
pub const IGNORE_ENV_VAR: &str = "DIRHASH_IGNORE";

/// Parse ignore-file contents (trim, skip empty and #).
pub fn parse_ignore_patterns(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse an ignore file.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| DirhashError::io(path, e))?;
    Ok(parse_ignore_patterns(&contents))
}

/// Ignore patterns for `root`, consulting `DIRHASH_IGNORE` when the root has no ignore file.
pub fn ignore_file_patterns(root: &Path) -> Result<Vec<String>> {
    let remote = std::env::var_os(IGNORE_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    ignore_file_patterns_with(root, remote.as_deref())
}

/// Ignore patterns for `root` with an explicit remote ignore file.
///
/// The root's `.dirhashignore` takes precedence; `remote` is only read when
/// it is absent, and is an error if it does not exist.
pub fn ignore_file_patterns_with(root: &Path, remote: Option<&Path>) -> Result<Vec<String>> {
    let local = root.join(IGNORE_FILE_NAME);
    if local.is_file() {
        let patterns = read_ignore_file(&local)?;
        debug!(path = %local.display(), count = patterns.len(), "Loaded ignore file");
        return Ok(patterns);
    }

    match remote {
        Some(remote) if !remote.exists() => Err(DirhashError::IgnoreFileNotFound(remote.to_path_buf())),
        Some(remote) => {
            let patterns = read_ignore_file(remote)?;
            debug!(
                path = %remote.display(),
                count = patterns.len(),
                "Loaded ignore file from {}",
                IGNORE_ENV_VAR
            );
            Ok(patterns)
        }
        None => Ok(Vec::new()),
    }
}
