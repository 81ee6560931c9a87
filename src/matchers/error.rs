use thiserror::Error;

use super::path::FieldPath;

/// Outcome of evaluating a [`Matcher`](super::Matcher).
pub type MatchResult = Result<(), MatchError>;

/// The first expectation a document failed to meet.
///
/// Paths are absolute from the point evaluation started, e.g.
/// `[kind=Deployment].spec.template.spec.containers[name=uaa].env[spring_profiles]`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// The target exists but holds a different value.
    #[error("{path} expected {expected} got {actual}")]
    Mismatch {
        path: FieldPath,
        expected: String,
        actual: String,
    },

    /// The target does not exist: a missing field, subset key, collection
    /// entry, or a lookup that selected nothing.
    #[error("{path}: {what} not found")]
    NotFound {
        path: FieldPath,
        what: String,
    },
}

impl MatchError {
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Mismatch {
                path,
                ..
            }
            | Self::NotFound {
                path,
                ..
            } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
