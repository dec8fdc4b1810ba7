//! Filtered, symlink-aware directory walker
//!
//! The walk is depth-first: a directory's children are visited before the
//! directory itself, so a [`Visitor`] can fold results bottom-up while the
//! walk unwinds. Symlinked directories are checked against the real paths of
//! the directories currently being visited (the ancestors of the branch, not
//! everything seen so far), which is what detects cyclic links.

use crate::error::{DirhashError, Result};
use crate::tree::filter::Filter;
use crate::tree::path::RecursionPath;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// A visited directory with the visitor results of its accepted children,
/// in discovery order.
#[derive(Debug, Clone)]
pub struct DirNode<F, D> {
    pub path: RecursionPath,
    pub directories: Vec<D>,
    pub files: Vec<F>,
}

impl<F, D> DirNode<F, D> {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// A symlinked directory that was not followed
#[derive(Debug, Clone)]
pub struct LinkedDir {
    pub path: RecursionPath,
}

/// A symlinked directory pointing back at a directory of the current branch
#[derive(Debug, Clone)]
pub struct CyclicLinkedDir {
    pub path: RecursionPath,
    pub target_path: RecursionPath,
}

/// Every kind of directory the walk can produce
#[derive(Debug, Clone)]
pub enum Node<F, D> {
    Dir(DirNode<F, D>),
    Linked(LinkedDir),
    Cyclic(CyclicLinkedDir),
}

impl<F, D> Node<F, D> {
    pub fn path(&self) -> &RecursionPath {
        match self {
            Node::Dir(dir) => &dir.path,
            Node::Linked(linked) => &linked.path,
            Node::Cyclic(cyclic) => &cyclic.path,
        }
    }

    /// Link nodes are leaves and never count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Dir(dir) => dir.is_empty(),
            Node::Linked(_) | Node::Cyclic(_) => false,
        }
    }
}

/// Callbacks producing per-file and per-directory results during a walk
pub trait Visitor {
    type File;
    type Dir;

    fn visit_file(&mut self, path: RecursionPath) -> Result<Self::File>;

    /// Called once all children of `node` have been visited. Not called for
    /// the walk root, which is returned to the caller instead.
    fn visit_dir(&mut self, node: Node<Self::File, Self::Dir>) -> Result<Self::Dir>;
}

/// A walked subtree kept in memory for later passes
#[derive(Debug, Clone)]
pub struct Tree(pub Node<RecursionPath, Tree>);

impl Tree {
    /// Fold the subtree with `visitor`, children before parents.
    pub fn apply<V: Visitor>(self, visitor: &mut V) -> Result<V::Dir> {
        let node = match self.0 {
            Node::Dir(dir) => Node::Dir(dir.replay(visitor)?),
            Node::Linked(linked) => Node::Linked(linked),
            Node::Cyclic(cyclic) => Node::Cyclic(cyclic),
        };
        visitor.visit_dir(node)
    }
}

impl DirNode<RecursionPath, Tree> {
    /// Run `visitor` over the children of an already walked directory.
    pub fn replay<V: Visitor>(self, visitor: &mut V) -> Result<DirNode<V::File, V::Dir>> {
        let directories = self
            .directories
            .into_iter()
            .map(|tree| tree.apply(visitor))
            .collect::<Result<Vec<_>>>()?;
        let files = self
            .files
            .into_iter()
            .map(|path| visitor.visit_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(DirNode {
            path: self.path,
            directories,
            files,
        })
    }
}

/// Visitor that keeps the walked structure as a [`Tree`]
#[derive(Debug, Default)]
pub struct TreeCollector;

impl Visitor for TreeCollector {
    type File = RecursionPath;
    type Dir = Tree;

    fn visit_file(&mut self, path: RecursionPath) -> Result<RecursionPath> {
        Ok(path)
    }

    fn visit_dir(&mut self, node: Node<RecursionPath, Tree>) -> Result<Tree> {
        Ok(Tree(node))
    }
}

/// Walker configuration
#[derive(Debug, Clone, Copy)]
pub struct WalkerConfig {
    /// Descend into symlinked directories (with cycle detection)
    pub follow_links: bool,
    /// Represent cyclic links as [`CyclicLinkedDir`] instead of failing
    pub allow_cyclic_links: bool,
    /// Keep directories with no accepted content
    pub include_empty: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_links: true,
            allow_cyclic_links: false,
            include_empty: false,
        }
    }
}

/// Directory walker
pub struct Walker<'a> {
    root: PathBuf,
    filter: &'a Filter,
    config: WalkerConfig,
}

type Ancestors = HashMap<PathBuf, RecursionPath>;

impl<'a> Walker<'a> {
    /// Walker following links, with empty-directory handling taken from the filter
    pub fn new(root: impl Into<PathBuf>, filter: &'a Filter) -> Self {
        let config = WalkerConfig {
            include_empty: filter.empty_dirs(),
            ..WalkerConfig::default()
        };
        Self::with_config(root, filter, config)
    }

    pub fn with_config(root: impl Into<PathBuf>, filter: &'a Filter, config: WalkerConfig) -> Self {
        Self {
            root: root.into(),
            filter,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree, returning the root level unvisited so the caller can
    /// decide what an empty root means.
    pub fn walk<V: Visitor>(&self, visitor: &mut V) -> Result<DirNode<V::File, V::Dir>> {
        let root = RecursionPath::from_root(&self.root)?;
        let mut ancestors = Ancestors::new();
        ancestors.insert(root.real().to_path_buf(), root.clone());
        self.scan(root, &mut ancestors, visitor)
    }

    /// Walk the tree and keep it in memory.
    pub fn collect(&self) -> Result<DirNode<RecursionPath, Tree>> {
        self.walk(&mut TreeCollector)
    }

    fn descend<V: Visitor>(
        &self,
        path: RecursionPath,
        ancestors: &mut Ancestors,
        visitor: &mut V,
    ) -> Result<Node<V::File, V::Dir>> {
        if path.is_symlink() {
            if !self.config.follow_links {
                return Ok(Node::Linked(LinkedDir { path }));
            }
            if let Some(first) = ancestors.get(path.real()) {
                if self.config.allow_cyclic_links {
                    debug!(
                        link = %path.relative(),
                        target = %first.relative(),
                        "Cyclic link kept as reference"
                    );
                    let target_path = first.clone();
                    return Ok(Node::Cyclic(CyclicLinkedDir { path, target_path }));
                }
                return Err(DirhashError::SymlinkRecursion {
                    real_path: path.real().to_path_buf(),
                    first_path: first.absolute(),
                    second_path: path.absolute(),
                });
            }
        }

        if !self.config.follow_links {
            return self.scan(path, ancestors, visitor).map(Node::Dir);
        }

        let real = path.real().to_path_buf();
        let shadowed = ancestors.insert(real.clone(), path.clone());
        let scanned = self.scan(path, ancestors, visitor);
        match shadowed {
            Some(previous) => {
                ancestors.insert(real, previous);
            }
            None => {
                ancestors.remove(&real);
            }
        }
        scanned.map(Node::Dir)
    }

    fn scan<V: Visitor>(
        &self,
        path: RecursionPath,
        ancestors: &mut Ancestors,
        visitor: &mut V,
    ) -> Result<DirNode<V::File, V::Dir>> {
        trace!(path = %path.relative(), "Scanning directory");
        let listing = fs::read_dir(path.real()).map_err(|e| DirhashError::io(path.real(), e))?;

        let mut directories = Vec::new();
        let mut files = Vec::new();
        for dir_entry in listing {
            let dir_entry = dir_entry.map_err(|e| DirhashError::io(path.real(), e))?;
            let child = path.join(&dir_entry);
            if !self.filter.include(&child) {
                trace!(path = %child.relative(), "Excluded by filter");
                continue;
            }

            if child.is_dir() {
                let node = self.descend(child, ancestors, visitor)?;
                if self.config.include_empty || !node.is_empty() {
                    directories.push(visitor.visit_dir(node)?);
                } else {
                    trace!(path = %node.path().relative(), "Dropping empty directory");
                }
            } else if child.is_file() {
                files.push(visitor.visit_file(child)?);
            } else if child.is_symlink() {
                warn!(path = %child.relative(), "Skipping dangling symlink");
            } else {
                debug!(path = %child.relative(), "Skipping special file");
            }
        }

        Ok(DirNode {
            path,
            directories,
            files,
        })
    }
}
