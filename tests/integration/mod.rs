//! Integration test suite for manifest-harness
//!
//! Renders the template fixtures under `tests/fixtures/k8s` and checks them
//! with the matcher engine.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=manifest_harness=debug cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **deployment**: UAA Deployment scenarios (image, resources, database, labels)
//! - **precedence**: resolution order across defaults, overlays, scripts and overrides
//! - **matching**: matcher diagnostics and reuse against rendered documents
//! - **errors**: failures that abort a render
//! - **config**: scenarios loaded from `render.toml`
//! - **concurrency**: independent scenarios on parallel threads

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod config;
mod deployment;
mod errors;
mod matching;
mod precedence;
