//! Build options from a JSON config file, overridden by command-line flags.
use std::path::Path;
use anyhow::{Context, Result};

use crate::builder::BuildOptions;

pub fn load_options(path: &Path) -> Result<BuildOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let options = crate::path_de::from_str_with_path::<BuildOptions>(&source)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::debug!(?options, path = %path.display(), "loaded config");
    Ok(options)
}

/// Config file (if any) first, then flag overrides.
pub fn resolve_options(config: Option<&Path>, max_depth: Option<usize>) -> Result<BuildOptions> {
    let mut options = match config {
        Some(path) => load_options(path)?,
        None => BuildOptions::default(),
    };
    if max_depth.is_some() {
        options.max_depth = max_depth;
    }
    Ok(options)
}
