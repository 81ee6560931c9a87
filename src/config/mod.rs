//! Render configuration.
//!
//! - [`RenderSettings`]: limits applied while loading templates
//! - [`RenderManifest`]: a whole rendering scenario in a TOML file, turned
//!   into a [`RenderingContext`](crate::render::RenderingContext) with
//!   [`RenderManifest::into_context`]
//! - [`parse_config`]: TOML file parsing with path context in errors
//!
//! Loading reports failures through `anyhow` with the file path attached.
//! Rendering itself never reads configuration from the environment or the
//! user's home directory.

mod manifest;
mod parser;
mod settings;

pub use manifest::{RenderManifest, SourceEntry};
pub use parser::parse_config;
pub use settings::{DEFAULT_MAX_TEMPLATE_SIZE, RenderSettings};
