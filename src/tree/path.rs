//! Recursion paths and lazily resolved entry metadata
//!
//! A [`RecursionPath`] tracks one filesystem entry during a walk: the root it
//! was reached from, its `/`-separated path relative to that root, and its real
//! (symlink-resolved) path. Type information and stat results live in an
//! [`EntryResolver`] that only touches the filesystem on first request.

use crate::error::{DirhashError, Result};
use std::cell::OnceCell;
use std::fs::{self, FileType, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Canonicalize a path, keeping the result free of `\\?\` prefixes on Windows.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| DirhashError::io(path, e))
}

/// Wraps one filesystem entry and caches what has been learned about it.
#[derive(Debug, Clone)]
pub struct EntryResolver {
    path: PathBuf,
    name: String,
    /// File type as reported by the directory listing (never follows links)
    listed_type: Option<FileType>,
    metadata: OnceCell<Option<Metadata>>,
    symlink_metadata: OnceCell<Option<Metadata>>,
}

impl EntryResolver {
    fn from_dir_entry(entry: &fs::DirEntry) -> Self {
        Self {
            path: entry.path(),
            name: entry.file_name().to_string_lossy().into_owned(),
            listed_type: entry.file_type().ok(),
            metadata: OnceCell::new(),
            symlink_metadata: OnceCell::new(),
        }
    }

    fn from_path(path: &Path, real: &Path) -> Self {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => real
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Self {
            path: path.to_path_buf(),
            name,
            listed_type: None,
            metadata: OnceCell::new(),
            symlink_metadata: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metadata following symlinks; `None` for dangling links or vanished entries.
    pub fn stat(&self) -> Option<&Metadata> {
        self.metadata
            .get_or_init(|| fs::metadata(&self.path).ok())
            .as_ref()
    }

    /// Metadata of the entry itself, without following a final symlink.
    pub fn lstat(&self) -> Option<&Metadata> {
        self.symlink_metadata
            .get_or_init(|| fs::symlink_metadata(&self.path).ok())
            .as_ref()
    }

    pub fn is_symlink(&self) -> bool {
        match self.listed_type {
            Some(file_type) => file_type.is_symlink(),
            None => self.lstat().is_some_and(|m| m.file_type().is_symlink()),
        }
    }

    /// Directory check following symlinks
    pub fn is_dir(&self) -> bool {
        match self.listed_type {
            Some(file_type) if !file_type.is_symlink() => file_type.is_dir(),
            _ => self.stat().is_some_and(Metadata::is_dir),
        }
    }

    /// Regular-file check following symlinks
    pub fn is_file(&self) -> bool {
        match self.listed_type {
            Some(file_type) if !file_type.is_symlink() => file_type.is_file(),
            _ => self.stat().is_some_and(Metadata::is_file),
        }
    }

    #[cfg(unix)]
    pub fn inode(&self) -> Option<u64> {
        use std::os::unix::fs::MetadataExt;
        self.lstat().map(|m| m.ino())
    }
}

/// One entry visited during a walk
#[derive(Debug, Clone)]
pub struct RecursionPath {
    root: Arc<Path>,
    relative: String,
    real: PathBuf,
    entry: EntryResolver,
}

impl RecursionPath {
    /// Create the path for the walk root. The root is made absolute without
    /// resolving links; the real path is resolved eagerly.
    pub fn from_root(directory: &Path) -> Result<Self> {
        let real = canonicalize_path(directory)?;
        let root = std::path::absolute(directory).map_err(|e| DirhashError::io(directory, e))?;
        let entry = EntryResolver::from_path(&root, &real);
        Ok(Self {
            root: Arc::from(root.as_path()),
            relative: String::new(),
            real,
            entry,
        })
    }

    /// Path of a directly contained entry. Symlinked entries get their real
    /// path resolved here, once; a dangling link keeps its joined path.
    pub(crate) fn join(&self, dir_entry: &fs::DirEntry) -> Self {
        let entry = EntryResolver::from_dir_entry(dir_entry);
        let relative = if self.relative.is_empty() {
            entry.name().to_string()
        } else {
            format!("{}/{}", self.relative, entry.name())
        };
        let joined = self.real.join(dir_entry.file_name());
        let real = if entry.is_symlink() {
            dunce::canonicalize(&joined).unwrap_or(joined)
        } else {
            joined
        };
        Self {
            root: Arc::clone(&self.root),
            relative,
            real,
            entry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `/`-separated path relative to the root; empty for the root itself.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn real(&self) -> &Path {
        &self.real
    }

    /// Root-anchored path for diagnostics. The root renders with a trailing separator.
    pub fn absolute(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn entry(&self) -> &EntryResolver {
        &self.entry
    }

    pub fn is_symlink(&self) -> bool {
        self.entry.is_symlink()
    }

    pub fn is_dir(&self) -> bool {
        self.entry.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.entry.is_file()
    }
}
