use serde::{Deserialize, Serialize};

/// Default upper bound on a template file read: 1 MiB.
pub const DEFAULT_MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

const fn default_max_template_size() -> u64 {
    DEFAULT_MAX_TEMPLATE_SIZE
}

/// Limits applied while loading template sources.
///
/// ```toml
/// [settings]
/// max_template_size = 2097152  # 2 MiB
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSettings {
    /// Largest template file, in bytes, that will be read.
    #[serde(default = "default_max_template_size")]
    pub max_template_size: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_template_size: default_max_template_size(),
        }
    }
}
