//! Deployment functions used across test cases.

use std::path::PathBuf;

/// The configuration directory used by the connector tests.
pub const STATIC_CONFIGURATION_PATH: &str = "static/";

/// Find the project root via the crate root provided by `cargo test`,
/// and get a path relative to it.
/// This depends on the convention that all our crates live in `/crates/<group>/<name>`
/// and will break in the unlikely case that we change this
pub fn get_path_from_project_root(path: &str) -> PathBuf {
    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push("../../../");
    d.push(path);
    d
}
