//! Test utilities.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! ```rust,no_run
//! use manifest_harness::test_utils::{TemplateDir, TemplateFixture};
//!
//! let dir = TemplateDir::with_fixtures(&[TemplateFixture::config_map()]).unwrap();
//! let rendered = dir.context(["configmap.yml"]).with_data([("name", "uaa")]).render().unwrap();
//! ```

pub mod environment;
pub mod fixtures;

pub use environment::TemplateDir;
pub use fixtures::TemplateFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off.
///
/// ```bash
/// RUST_LOG=manifest_harness=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
