//! Integration tests for directory hashing

mod cli;
mod symlinks;
