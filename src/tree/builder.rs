//! Directory hash engine
//!
//! Ties the walker, the hashing protocol and file content hashing together.
//! With one job the tree is hashed in a single pass, file digests cached by
//! real path. With more jobs the tree is walked first, the distinct real file
//! paths are hashed on a rayon pool, and the kept tree is then folded with the
//! same protocol logic, so the result never depends on the worker count.

use crate::algorithm::{Algorithm, HasherFactory, StreamHasher};
use crate::error::{DirhashError, Result};
use crate::tree::filter::Filter;
use crate::tree::hasher::{self, HashedEntry, Protocol, DEFAULT_CHUNK_SIZE};
use crate::tree::path::RecursionPath;
use crate::tree::walker::{DirNode, Node, Tree, Visitor, Walker, WalkerConfig};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

/// Computes directory digests for one algorithm, filter and protocol
#[derive(Clone)]
pub struct DirHashEngine {
    factory: Arc<dyn HasherFactory>,
    algorithm: String,
    filter: Filter,
    protocol: Protocol,
    chunk_size: usize,
    jobs: usize,
}

impl DirHashEngine {
    /// Engine for a built-in algorithm name; unknown names fail here, before any walk.
    pub fn new(algorithm: &str, filter: Filter, protocol: Protocol) -> Result<Self> {
        let parsed: Algorithm = algorithm.parse()?;
        let mut engine = Self::with_factory(Arc::new(parsed), filter, protocol);
        engine.algorithm = parsed.name().to_string();
        Ok(engine)
    }

    /// Engine for a caller-supplied hasher factory
    pub fn with_factory(factory: Arc<dyn HasherFactory>, filter: Filter, protocol: Protocol) -> Self {
        Self {
            factory,
            algorithm: "custom".to_string(),
            filter,
            protocol,
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: 1,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DirhashError::InvalidArgument(
                "chunk_size must be a positive integer".to_string(),
            ));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// `1` hashes sequentially; any other value uses a worker pool of that
    /// size, `0` meaning one worker per CPU.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_links: true,
            allow_cyclic_links: self.protocol.allow_cyclic_links(),
            include_empty: self.filter.empty_dirs(),
        }
    }

    /// Hex digest of `directory`
    #[instrument(skip(self, directory), fields(root = %directory.display(), algorithm = %self.algorithm, jobs = self.jobs))]
    pub fn compute(&self, directory: &Path) -> Result<String> {
        check_directory(directory)?;
        let start = Instant::now();
        let strategy = if self.jobs == 1 { "sequential" } else { "parallel" };
        info!(strategy, "Starting directory hash");

        let walker = Walker::with_config(directory, &self.filter, self.walker_config());
        let mut folder = Folder::new(&self.protocol, self.factory.as_ref(), self.chunk_size);
        let root = if self.jobs == 1 {
            walker.walk(&mut folder)?
        } else {
            let tree = walker.collect()?;
            folder.digests = self.hash_files_parallel(&tree)?;
            tree.replay(&mut folder)?
        };

        if root.is_empty() && !self.filter.empty_dirs() {
            return Err(DirhashError::NothingToHash(directory.to_path_buf()));
        }
        let descriptor = self.protocol.descriptor(&Node::Dir(root));
        let digest = hasher::hash_descriptor(self.factory.as_ref(), &descriptor);

        info!(
            strategy,
            files_hashed = folder.digests.len(),
            digest = %digest,
            duration_ms = start.elapsed().as_millis(),
            "Directory hash completed"
        );
        Ok(digest)
    }

    /// Sorted relative paths of every leaf `compute` would fold over: files,
    /// and `<dir>/.` for empty, linked or cyclic directories. An empty root
    /// is itself the only leaf and lists as `.`. No file is read.
    #[instrument(skip(self, directory), fields(root = %directory.display()))]
    pub fn list_included(&self, directory: &Path) -> Result<Vec<String>> {
        check_directory(directory)?;
        let walker = Walker::with_config(directory, &self.filter, self.walker_config());
        let mut folder = Folder::dry_run(&self.protocol);
        let root = walker.walk(&mut folder)?;

        let mut leaves = folder.leaves.unwrap_or_default();
        if root.is_empty() {
            leaves.push(".".to_string());
        }
        leaves.sort();
        debug!(count = leaves.len(), "Listed included paths");
        Ok(leaves)
    }

    fn hash_files_parallel(&self, tree: &DirNode<RecursionPath, Tree>) -> Result<HashMap<PathBuf, String>> {
        let mut real_paths = BTreeSet::new();
        collect_real_files(tree, &mut real_paths);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|index| format!("dirhash-worker-{}", index))
            .build()?;
        debug!(
            files = real_paths.len(),
            workers = pool.current_num_threads(),
            "Dispatching file hashing"
        );

        let factory = self.factory.as_ref();
        let chunk_size = self.chunk_size;
        pool.install(|| {
            real_paths
                .par_iter()
                .map(|real| {
                    trace!(path = %real.display(), "Hashing file");
                    hasher::hash_file(real, factory, chunk_size).map(|digest| (real.clone(), digest))
                })
                .collect::<Result<HashMap<_, _>>>()
        })
    }
}

impl std::fmt::Debug for DirHashEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirHashEngine")
            .field("algorithm", &self.algorithm)
            .field("filter", &self.filter)
            .field("protocol", &self.protocol)
            .field("chunk_size", &self.chunk_size)
            .field("jobs", &self.jobs)
            .finish()
    }
}

fn check_directory(directory: &Path) -> Result<()> {
    match fs::metadata(directory) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        _ => Err(DirhashError::NotADirectory(directory.to_path_buf())),
    }
}

fn collect_real_files(dir: &DirNode<RecursionPath, Tree>, out: &mut BTreeSet<PathBuf>) {
    out.extend(dir.files.iter().map(|file| file.real().to_path_buf()));
    for Tree(node) in &dir.directories {
        if let Node::Dir(subdir) = node {
            collect_real_files(subdir, out);
        }
    }
}

/// Bottom-up fold producing [`HashedEntry`] values. File digests are looked
/// up by real path and computed on first use; in a dry run files are not read
/// and the visited leaves are recorded instead.
struct Folder<'a> {
    protocol: &'a Protocol,
    factory: &'a dyn HasherFactory,
    chunk_size: usize,
    digests: HashMap<PathBuf, String>,
    leaves: Option<Vec<String>>,
}

impl<'a> Folder<'a> {
    fn new(protocol: &'a Protocol, factory: &'a dyn HasherFactory, chunk_size: usize) -> Self {
        Self {
            protocol,
            factory,
            chunk_size,
            digests: HashMap::new(),
            leaves: None,
        }
    }

    fn dry_run(protocol: &'a Protocol) -> Self {
        Self {
            protocol,
            factory: &NoopHasher,
            chunk_size: DEFAULT_CHUNK_SIZE,
            digests: HashMap::new(),
            leaves: Some(Vec::new()),
        }
    }

    fn file_digest(&mut self, path: &RecursionPath) -> Result<String> {
        if self.leaves.is_some() {
            return Ok(String::new());
        }
        if let Some(digest) = self.digests.get(path.real()) {
            return Ok(digest.clone());
        }
        trace!(path = %path.relative(), "Hashing file");
        let digest = hasher::hash_file(path.real(), self.factory, self.chunk_size)?;
        self.digests.insert(path.real().to_path_buf(), digest.clone());
        Ok(digest)
    }
}

impl Visitor for Folder<'_> {
    type File = HashedEntry;
    type Dir = HashedEntry;

    fn visit_file(&mut self, path: RecursionPath) -> Result<HashedEntry> {
        if let Some(leaves) = self.leaves.as_mut() {
            leaves.push(path.relative().to_string());
        }
        let digest = self.file_digest(&path)?;
        Ok(HashedEntry { path, digest })
    }

    fn visit_dir(&mut self, node: Node<HashedEntry, HashedEntry>) -> Result<HashedEntry> {
        if let Some(leaves) = self.leaves.as_mut() {
            if node.is_empty() || !matches!(node, Node::Dir(_)) {
                leaves.push(format!("{}/.", node.path().relative()));
            }
        }
        let descriptor = self.protocol.descriptor(&node);
        let digest = hasher::hash_descriptor(self.factory, &descriptor);
        debug!(path = %node.path().relative(), "Hashed directory");
        let path = match node {
            Node::Dir(dir) => dir.path,
            Node::Linked(linked) => linked.path,
            Node::Cyclic(cyclic) => cyclic.path,
        };
        Ok(HashedEntry { path, digest })
    }
}

/// Stand-in hasher for dry runs
struct NoopHasher;

impl HasherFactory for NoopHasher {
    fn create(&self) -> Box<dyn StreamHasher> {
        Box::new(NoopHasher)
    }
}

impl StreamHasher for NoopHasher {
    fn update(&mut self, _data: &[u8]) {}

    fn finalize_hex(self: Box<Self>) -> String {
        String::new()
    }
}
