//! Manifest Harness - render layered Kubernetes manifest templates and assert
//! on their structure.
//!
//! The crate has two halves that meet at [`RenderedDocument`]:
//!
//! - The **rendering engine** composes a base manifest template with value
//!   overlays, script layers and caller overrides into concrete YAML
//!   documents.
//! - The **matcher engine** checks that a rendered document contains an
//!   expected sub-structure, ignoring everything a test does not mention, and
//!   reports the path of the first field that differs.
//!
//! # Example
//!
//! ```rust,no_run
//! use manifest_harness::matchers::{produce_yaml, representing_deployment};
//! use manifest_harness::render::RenderingContext;
//!
//! # fn example() -> manifest_harness::core::Result<()> {
//! let ctx = RenderingContext::from_paths([
//!     "k8s/templates/deployment.yml",
//!     "k8s/templates/values/_values.yml",
//!     "k8s/templates/values/image.yml",
//!     "k8s/templates/deployment.star",
//! ])
//! .with_data([("database.scheme", "postgresql")]);
//!
//! produce_yaml(
//!     &ctx,
//!     representing_deployment().with_pod_matching(|pod| {
//!         pod.with_container_matching(|c| c.with_name("uaa").with_env_var("spring_profiles", "postgresql"))
//!     }),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! ## Rendering
//! - [`source`] - template sources and source sets
//! - [`values`] - override maps, the variable environment, overlay flattening
//! - [`templating`] - Tera placeholder substitution and `#@` directives
//! - [`script`] - script layers that derive values before overrides apply
//! - [`render`] - the pipeline and [`RenderedDocument`]
//!
//! ## Matching
//! - [`matchers`] - field paths, constraints, typed Kubernetes builders
//!
//! ## Supporting
//! - [`config`] - render settings and TOML render manifests
//! - [`core`] - crate-wide error type
//!
//! # Concurrency
//!
//! Contexts, documents and matchers are immutable values with no shared
//! state, so unrelated scenarios can render and match on separate threads.

// Rendering
pub mod render;
pub mod script;
pub mod source;
pub mod templating;
pub mod values;

// Matching
pub mod matchers;

// Supporting modules
pub mod config;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use matchers::{Matcher, evaluate, produce_yaml, representing_deployment};
pub use render::{RenderedDocument, RenderingContext};
pub use source::{TemplateSource, TemplateSourceSet};
pub use values::OverrideMap;
