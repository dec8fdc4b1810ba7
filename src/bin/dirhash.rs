//! dirhash CLI Binary
//!
//! Prints the hash of a directory, or the list of files it covers.

use anyhow::Context;
use clap::Parser;
use dirhash::cli::{build_logging_config, map_error, run, Cli};
use dirhash::config::ConfigLoader;
use dirhash::logging::init_logging;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    match try_main(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn try_main(cli: &Cli) -> anyhow::Result<String> {
    let config = ConfigLoader::load_with(cli.config.as_deref())
        .context("failed to load configuration")?;

    let logging_config = build_logging_config(cli, &config.logging);
    init_logging(Some(&logging_config)).context("failed to initialize logging")?;

    info!(directory = %cli.directory.display(), "dirhash starting");
    Ok(run(cli, &config)?)
}
