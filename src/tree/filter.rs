//! Path filtering for the tree walk
//!
//! Match patterns follow `.gitignore` syntax but select what to *include*:
//! patterns apply in order, the last one matching a path decides, and a
//! leading `!` turns a pattern into an exclusion. Paths are matched relative
//! to the walk root, and a directory pattern (`build/`, `.*/`) also matches
//! everything below such a directory.

use crate::error::{DirhashError, Result};
use crate::tree::path::RecursionPath;
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Pattern used when no match patterns are given
pub const MATCH_ALL: &str = "*";

#[derive(Debug, Clone)]
struct Rule {
    negated: bool,
    matcher: Gitignore,
}

impl Rule {
    fn compile(pattern: &str) -> Result<Option<Self>> {
        let (negated, body) = match pattern.strip_prefix('!') {
            Some(body) => (true, body),
            None => (false, pattern),
        };
        if body.trim().is_empty() || body.starts_with('#') {
            return Ok(None);
        }

        let invalid = |e: ::ignore::Error| DirhashError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        };
        let mut builder = GitignoreBuilder::new(".");
        builder.add_line(None, body).map_err(invalid)?;
        let matcher = builder.build().map_err(invalid)?;
        Ok(Some(Self { negated, matcher }))
    }

    fn matches(&self, relative: &str) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }
}

/// Compiled, ordered match patterns
#[derive(Debug, Clone)]
pub struct MatchPatterns {
    patterns: Vec<String>,
    rules: Vec<Rule>,
}

impl MatchPatterns {
    /// Compile patterns; an empty list means "include everything".
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        if patterns.is_empty() {
            patterns.push(MATCH_ALL.to_string());
        }

        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            if let Some(rule) = Rule::compile(pattern)? {
                rules.push(rule);
            }
        }
        Ok(Self { patterns, rules })
    }

    /// Compose a match list from include patterns and the ignore shorthands.
    ///
    /// `ignore` patterns are appended with a `!` prefix, each extension becomes
    /// `*.<ext>`, and `ignore_hidden` adds `.*` and `.*/`. Duplicates are
    /// dropped, keeping the first occurrence.
    pub fn compose<S: AsRef<str>>(
        match_patterns: &[S],
        ignore: &[S],
        ignore_extensions: &[S],
        ignore_hidden: bool,
    ) -> Vec<String> {
        let mut composed: Vec<String> = if match_patterns.is_empty() {
            vec![MATCH_ALL.to_string()]
        } else {
            match_patterns.iter().map(|p| p.as_ref().to_string()).collect()
        };

        let mut ignored: Vec<String> = ignore.iter().map(|p| p.as_ref().to_string()).collect();
        if ignore_hidden {
            ignored.push(".*".to_string());
            ignored.push(".*/".to_string());
        }
        for ext in ignore_extensions {
            let ext = ext.as_ref();
            if ext.starts_with('.') {
                ignored.push(format!("*{}", ext));
            } else {
                ignored.push(format!("*.{}", ext));
            }
        }
        composed.extend(ignored.into_iter().map(|p| format!("!{}", p)));

        let mut seen = std::collections::HashSet::new();
        composed.retain(|p| seen.insert(p.clone()));
        composed
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a root-relative, `/`-separated path is included.
    pub fn matches(&self, relative: &str) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(relative))
            .is_some_and(|rule| !rule.negated)
    }
}

impl Default for MatchPatterns {
    fn default() -> Self {
        let rule = Rule::compile(MATCH_ALL)
            .ok()
            .flatten()
            .into_iter()
            .collect();
        Self {
            patterns: vec![MATCH_ALL.to_string()],
            rules: rule,
        }
    }
}

/// Decides which entries take part in the walk.
#[derive(Debug, Clone)]
pub struct Filter {
    match_patterns: MatchPatterns,
    linked_dirs: bool,
    linked_files: bool,
    empty_dirs: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(MatchPatterns::default())
    }
}

impl Filter {
    /// Filter that follows linked directories and files and skips empty directories
    pub fn new(match_patterns: MatchPatterns) -> Self {
        Self {
            match_patterns,
            linked_dirs: true,
            linked_files: true,
            empty_dirs: false,
        }
    }

    pub fn with_linked_dirs(mut self, linked_dirs: bool) -> Self {
        self.linked_dirs = linked_dirs;
        self
    }

    pub fn with_linked_files(mut self, linked_files: bool) -> Self {
        self.linked_files = linked_files;
        self
    }

    pub fn with_empty_dirs(mut self, empty_dirs: bool) -> Self {
        self.empty_dirs = empty_dirs;
        self
    }

    pub fn match_patterns(&self) -> &MatchPatterns {
        &self.match_patterns
    }

    pub fn linked_dirs(&self) -> bool {
        self.linked_dirs
    }

    pub fn linked_files(&self) -> bool {
        self.linked_files
    }

    pub fn empty_dirs(&self) -> bool {
        self.empty_dirs
    }

    /// Symlinks need `linked_dirs`/`linked_files`; directories are otherwise
    /// always entered; files must match the patterns.
    pub fn include(&self, path: &RecursionPath) -> bool {
        if path.is_symlink() {
            let allowed = if path.is_dir() {
                self.linked_dirs
            } else {
                self.linked_files
            };
            if !allowed {
                return false;
            }
        }
        if path.is_dir() {
            return true;
        }
        self.match_patterns.matches(path.relative())
    }
}
