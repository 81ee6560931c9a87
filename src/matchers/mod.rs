//! Structural assertions over rendered documents.
//!
//! A [`Matcher`] is an ordered list of [`Constraint`]s. Each constraint either
//! checks the node at a fixed [`FieldPath`] or looks up one element of a
//! sequence and applies a nested matcher to it. Evaluation is depth-first, in
//! insertion order, and stops at the first failure with a [`MatchError`]
//! naming the full path of the offending node.
//!
//! Matching is partial: fields a matcher does not mention are ignored, so a
//! test couples only to what it asserts.
//!
//! The [`kubernetes`] builders provide Deployment, pod and container
//! vocabulary on top of the generic constraints.

pub mod error;
mod expect;
pub mod kubernetes;
pub mod matcher;
pub mod path;

pub use error::{MatchError, MatchResult};
pub use expect::produce_yaml;
pub use kubernetes::{ContainerMatcher, DeploymentMatcher, PodMatcher, representing_deployment};
pub use matcher::{Constraint, Expectation, Matcher, Selector, evaluate};
pub use path::{FieldPath, PathError, Segment};
