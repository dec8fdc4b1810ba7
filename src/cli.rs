//! CLI domain: parse, route and output only.
//! No hashing logic; routing hands options to the flat API.

mod output;
mod parse;
mod route;

pub use output::{format_listing, map_error};
pub use parse::Cli;
pub use route::{build_logging_config, build_options, run};
