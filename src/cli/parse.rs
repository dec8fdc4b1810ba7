//! CLI parse: clap types for dirhash. No behavior; definitions only.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Determine the hash of a directory's content and/or structure
#[derive(Parser, Debug)]
#[command(name = "dirhash")]
#[command(version)]
#[command(about = "Deterministic hash of a directory tree")]
pub struct Cli {
    /// Directory to hash
    pub directory: PathBuf,

    /// Hashing algorithm (md5, sha1, sha224, sha256, sha384, sha512, blake3)
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Match patterns (gitignore syntax), space separated or repeated
    #[arg(short = 'm', long = "match", action = ArgAction::Append)]
    pub match_patterns: Vec<String>,

    /// Ignore patterns, space separated or repeated
    #[arg(short = 'i', long = "ignore", action = ArgAction::Append)]
    pub ignore_patterns: Vec<String>,

    /// File extensions to ignore (short for `--ignore "*.ext"`)
    #[arg(short = 'x', long, num_args = 1..)]
    pub ignore_extensions: Vec<String>,

    /// Ignore hidden ("dot") files and directories
    #[arg(short = 'd', long)]
    pub ignore_hidden: bool,

    /// Include empty directories
    #[arg(long, visible_alias = "include-empty")]
    pub empty_dirs: bool,

    /// Do not include symlinked directories
    #[arg(long)]
    pub no_linked_dirs: bool,

    /// Do not include symlinked files
    #[arg(long)]
    pub no_linked_files: bool,

    /// Entry properties to hash: name, data, is_link
    #[arg(short = 'p', long = "properties", num_args = 1.., conflicts_with_all = ["content_only", "paths_only"])]
    pub properties: Vec<String>,

    /// Hash file content only (same as `-p data`)
    #[arg(long, conflicts_with = "paths_only")]
    pub content_only: bool,

    /// Hash the paths only (same as `-p name`)
    #[arg(long)]
    pub paths_only: bool,

    /// Hash cyclic symlinks as a reference instead of failing
    #[arg(short = 'c', long)]
    pub allow_cyclic_links: bool,

    /// Read size in bytes for file content hashing
    #[arg(short = 's', long)]
    pub chunk_size: Option<usize>,

    /// Number of hashing workers (0 = one per CPU)
    #[arg(short = 'j', long, visible_alias = "workers")]
    pub jobs: Option<usize>,

    /// List the included files instead of printing the hash
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Do not read `.dirhashignore` or `DIRHASH_IGNORE`
    #[arg(long)]
    pub no_ignore_file: bool,

    /// Configuration file path (layered over the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging to stderr (default: off)
    #[arg(long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}
