//! Flat entry points
//!
//! [`dirhash`] and [`included_paths`] take every knob as one
//! [`DirhashOptions`] value, compose the match patterns (including the
//! `.dirhashignore` convention) and drive a [`DirHashEngine`].

use crate::error::Result;
use crate::ignore;
use crate::tree::builder::DirHashEngine;
use crate::tree::filter::{Filter, MatchPatterns};
use crate::tree::hasher::{Protocol, DEFAULT_CHUNK_SIZE};
use std::path::Path;

/// Options for hashing or listing a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirhashOptions {
    /// Algorithm name, e.g. `md5` or `sha256`
    pub algorithm: String,
    /// Include patterns; empty means `*`
    pub match_patterns: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// Extensions to ignore, with or without the leading dot
    pub ignore_extensions: Vec<String>,
    pub ignore_hidden: bool,
    pub linked_dirs: bool,
    pub linked_files: bool,
    pub empty_dirs: bool,
    pub entry_properties: Vec<String>,
    pub allow_cyclic_links: bool,
    pub chunk_size: usize,
    /// Worker count; `1` is sequential, `0` one worker per CPU
    pub jobs: usize,
    /// Honour `.dirhashignore` / `DIRHASH_IGNORE`
    pub use_ignore_file: bool,
}

impl Default for DirhashOptions {
    fn default() -> Self {
        Self {
            algorithm: "md5".to_string(),
            match_patterns: Vec::new(),
            ignore_patterns: Vec::new(),
            ignore_extensions: Vec::new(),
            ignore_hidden: false,
            linked_dirs: true,
            linked_files: true,
            empty_dirs: false,
            entry_properties: vec!["name".to_string(), "data".to_string()],
            allow_cyclic_links: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: 1,
            use_ignore_file: true,
        }
    }
}

impl DirhashOptions {
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Full match-pattern list for `directory`; ignore-file patterns come
    /// before the explicit ignore patterns.
    pub fn match_spec(&self, directory: &Path) -> Result<Vec<String>> {
        let mut ignore = if self.use_ignore_file {
            ignore::ignore_file_patterns(directory)?
        } else {
            Vec::new()
        };
        ignore.extend(self.ignore_patterns.iter().cloned());
        Ok(MatchPatterns::compose(
            &self.match_patterns,
            &ignore,
            &self.ignore_extensions,
            self.ignore_hidden,
        ))
    }

    pub fn protocol(&self) -> Result<Protocol> {
        Protocol::parse(&self.entry_properties, self.allow_cyclic_links)
    }

    pub fn filter(&self, directory: &Path) -> Result<Filter> {
        let patterns = MatchPatterns::new(self.match_spec(directory)?)?;
        Ok(Filter::new(patterns)
            .with_linked_dirs(self.linked_dirs)
            .with_linked_files(self.linked_files)
            .with_empty_dirs(self.empty_dirs))
    }

    /// Validate everything and build the engine; no traversal happens here.
    pub fn engine(&self, directory: &Path) -> Result<DirHashEngine> {
        let protocol = self.protocol()?;
        let filter = self.filter(directory)?;
        Ok(DirHashEngine::new(&self.algorithm, filter, protocol)?
            .with_chunk_size(self.chunk_size)?
            .with_jobs(self.jobs))
    }
}

/// Hex digest of `directory`
pub fn dirhash(directory: impl AsRef<Path>, options: &DirhashOptions) -> Result<String> {
    let directory = directory.as_ref();
    options.engine(directory)?.compute(directory)
}

/// Sorted relative paths `dirhash` would include for `directory`
pub fn included_paths(directory: impl AsRef<Path>, options: &DirhashOptions) -> Result<Vec<String>> {
    let directory = directory.as_ref();
    options.engine(directory)?.list_included(directory)
}
