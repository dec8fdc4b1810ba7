//! dirhash: Deterministic Directory Hashing
//!
//! Computes a single digest for a directory tree from the names and/or
//! contents of the entries it includes. Inclusion is controlled by
//! gitignore-style match patterns and symlink policies; the digest does not
//! depend on directory listing order or on the number of hashing workers.
//!
//! ```no_run
//! use dirhash::{dirhash, DirhashOptions};
//!
//! let options = DirhashOptions::default().with_algorithm("sha256");
//! let digest = dirhash("path/to/dir", &options)?;
//! println!("{digest}");
//! # Ok::<(), dirhash::DirhashError>(())
//! ```

pub mod algorithm;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod tree;

pub use algorithm::{algorithms_available, algorithms_guaranteed, Algorithm, HasherFactory, StreamHasher};
pub use api::{dirhash, included_paths, DirhashOptions};
pub use error::{DirhashError, Result};
pub use tree::builder::DirHashEngine;
pub use tree::filter::{Filter, MatchPatterns};
pub use tree::hasher::{CyclicLinkPolicy, EntryProperty, Protocol, DEFAULT_CHUNK_SIZE};
pub use tree::walker::{Visitor, Walker, WalkerConfig};
