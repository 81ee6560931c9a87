//! Shared helpers for the integration suite.

// Not every test module uses every helper
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use manifest_harness::render::RenderingContext;
use manifest_harness::test_utils::init_test_logging;

/// Path of a file under `tests/fixtures/k8s`.
pub fn path_to_file(relative: impl AsRef<Path>) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("k8s").join(relative)
}

/// The UAA Deployment sources, without the metadata patch.
pub fn uaa_templates() -> Vec<PathBuf> {
    vec![
        path_to_file("deployment.yml"),
        path_to_file(Path::new("values").join("_values.yml")),
        path_to_file(Path::new("values").join("image.yml")),
        path_to_file(Path::new("values").join("version.yml")),
        path_to_file("deployment.star"),
    ]
}

pub fn uaa_context() -> RenderingContext {
    init_test_logging(None);
    RenderingContext::from_paths(uaa_templates())
}
