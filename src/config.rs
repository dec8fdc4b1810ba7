//! Configuration System
//!
//! Layered configuration for the command line tool: built-in defaults, the
//! global config file, an explicit `--config` file and `DIRHASH_*`
//! environment variables, in increasing precedence. Command line flags are
//! applied on top by the CLI.

use crate::error::{DirhashError, Result};
use crate::logging::LoggingConfig;
use crate::tree::hasher::DEFAULT_CHUNK_SIZE;
use ::config::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod sources;

pub use sources::{global_config_path, ENV_PREFIX};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirhashConfig {
    /// Hashing defaults used when no flag overrides them
    #[serde(default)]
    pub defaults: HashDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default hashing parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDefaults {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_entry_properties")]
    pub entry_properties: Vec<String>,
}

fn default_algorithm() -> String {
    "md5".to_string()
}

fn default_jobs() -> usize {
    1
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_entry_properties() -> Vec<String> {
    vec!["name".to_string(), "data".to_string()]
}

impl Default for HashDefaults {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            jobs: default_jobs(),
            chunk_size: default_chunk_size(),
            entry_properties: default_entry_properties(),
        }
    }
}

impl HashDefaults {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.algorithm.trim().is_empty() {
            return Err("Algorithm cannot be empty".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be a positive integer".to_string());
        }
        Ok(())
    }
}

impl DirhashConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if let Err(e) = self.defaults.validate() {
            errors.push(format!("defaults: {}", e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(format!("logging: {}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DirhashError::Config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}

/// Loads [`DirhashConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file and environment
    pub fn load() -> Result<DirhashConfig> {
        Self::load_with(None)
    }

    /// Defaults, global file, `explicit` file (if any) and environment
    pub fn load_with(explicit: Option<&Path>) -> Result<DirhashConfig> {
        let mut builder = sources::add_global_file(Config::builder());
        if let Some(path) = explicit {
            builder = sources::add_explicit_file(builder, path)?;
        }
        let builder = sources::add_environment(builder);
        Self::finish(builder.build()?)
    }

    /// Defaults and one file only, ignoring the global file and environment
    pub fn load_from_file(path: &Path) -> Result<DirhashConfig> {
        let builder = sources::add_explicit_file(Config::builder(), path)?;
        Self::finish(builder.build()?)
    }

    fn finish(config: Config) -> Result<DirhashConfig> {
        let config: DirhashConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
