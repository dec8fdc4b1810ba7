//! CLI output: error mapping and result rendering.

/// Map any error reaching the binary to its one-line stderr form.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("dirhash: {:#}", e)
}

/// One included path per line
pub fn format_listing(paths: &[String]) -> String {
    paths.join("\n")
}
