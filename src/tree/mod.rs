//! Directory tree hashing
//!
//! The walker produces a filtered, symlink-aware view of a directory; the
//! hashing protocol turns each directory's children into a canonical
//! descriptor; the engine folds descriptors bottom-up into the root digest.

pub mod builder;
pub mod filter;
pub mod hasher;
pub mod path;
pub mod walker;
