//! TOML parsing with file path context.
//!
//! Errors name the file and the failing step:
//!
//! ```text
//! Failed to parse render manifest: /path/to/render.toml
//! Caused by:
//!     invalid type: integer `1`, expected a string
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Read and deserialize a TOML file.
///
/// `what` names the file's role in error messages.
pub fn parse_config<T>(path: &Path, what: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", what, path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}: {}", what, path.display()))?;

    Ok(config)
}
