//! CLI route: turns parsed flags plus configuration into options and runs them.

use crate::api::{self, DirhashOptions};
use crate::cli::output::format_listing;
use crate::cli::parse::Cli;
use crate::config::{DirhashConfig, HashDefaults};
use crate::error::Result;
use crate::logging::LoggingConfig;
use tracing::{debug, info};

/// Split pattern arguments given as one space-separated string.
fn split_args(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split_whitespace())
        .map(str::to_string)
        .collect()
}

/// Options for this invocation: flags win over configuration defaults.
pub fn build_options(cli: &Cli, defaults: &HashDefaults) -> DirhashOptions {
    let entry_properties = if cli.content_only {
        vec!["data".to_string()]
    } else if cli.paths_only {
        vec!["name".to_string()]
    } else if !cli.properties.is_empty() {
        cli.properties
            .iter()
            .flat_map(|value| value.split([',', ' ']))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        defaults.entry_properties.clone()
    };

    DirhashOptions {
        algorithm: cli
            .algorithm
            .clone()
            .unwrap_or_else(|| defaults.algorithm.clone()),
        match_patterns: split_args(&cli.match_patterns),
        ignore_patterns: split_args(&cli.ignore_patterns),
        ignore_extensions: split_args(&cli.ignore_extensions),
        ignore_hidden: cli.ignore_hidden,
        linked_dirs: !cli.no_linked_dirs,
        linked_files: !cli.no_linked_files,
        empty_dirs: cli.empty_dirs,
        entry_properties,
        allow_cyclic_links: cli.allow_cyclic_links,
        chunk_size: cli.chunk_size.unwrap_or(defaults.chunk_size),
        jobs: cli.jobs.unwrap_or(defaults.jobs),
        use_ignore_file: !cli.no_ignore_file,
    }
}

/// Logging for this invocation: `--verbose` enables debug output on stderr,
/// explicit level and format flags win.
pub fn build_logging_config(cli: &Cli, configured: &LoggingConfig) -> LoggingConfig {
    let mut config = configured.clone();
    if cli.verbose {
        config.enabled = true;
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.enabled = true;
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}

/// Execute the invocation and return what goes to stdout.
pub fn run(cli: &Cli, config: &DirhashConfig) -> Result<String> {
    let options = build_options(cli, &config.defaults);
    debug!(?options, "Resolved options");

    if cli.list {
        let paths = api::included_paths(&cli.directory, &options)?;
        info!(count = paths.len(), "Listed included paths");
        Ok(format_listing(&paths))
    } else {
        api::dirhash(&cli.directory, &options)
    }
}
