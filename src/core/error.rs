//! Crate-wide error type.
//!
//! Rendering and matching each have their own error enums
//! ([`RenderError`], [`MatchError`]). [`Error`] unifies them for callers that
//! do both in one step, such as [`produce_yaml`](crate::matchers::produce_yaml).
//!
//! [`user_friendly_error`] wraps an error in an [`ErrorContext`] carrying a
//! suggestion for the most common failures:
//!
//! ```rust,no_run
//! use manifest_harness::core::user_friendly_error;
//! use manifest_harness::render::RenderingContext;
//!
//! let ctx = RenderingContext::from_paths(["deployment.yml"]);
//! if let Err(e) = ctx.render() {
//!     eprintln!("{}", user_friendly_error(e.into()));
//! }
//! ```

use std::fmt;
use thiserror::Error;

use crate::matchers::MatchError;
use crate::render::RenderError;
use crate::script::ScriptError;
use crate::templating::error::{ResolutionError, TemplateError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Document does not match: {0}")]
    Match(#[from] MatchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn is_match_failure(&self) -> bool {
        matches!(self, Self::Match(_))
    }

    pub fn as_match_error(&self) -> Option<&MatchError> {
        match self {
            Self::Match(e) => Some(e),
            Self::Render(_) => None,
        }
    }
}

/// An error with an optional hint and extra details for display.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: Error,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: Error) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\n\n{}", details)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nhint: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Attach a hint to well-known failures.
pub fn user_friendly_error(error: Error) -> ErrorContext {
    let (suggestion, details) = match &error {
        Error::Render(RenderError::Template(TemplateError::Unreadable {
            ..
        })) => (Some("Check that the template path is correct and readable".to_string()), None),
        Error::Render(RenderError::Template(TemplateError::TooLarge {
            ..
        })) => (Some("Raise settings.max_template_size in the render manifest".to_string()), None),
        Error::Render(RenderError::Template(TemplateError::NoBaseTemplate)) => (
            Some("Add a manifest template, or mark one with kind = \"base\"".to_string()),
            None,
        ),
        Error::Render(RenderError::Resolution(
            e @ ResolutionError::VariableNotFound {
                ..
            },
        )) => (
            Some("Declare a default with '#@default' or supply the value with with_data()".to_string()),
            Some(e.format_with_context()),
        ),
        Error::Render(RenderError::Script(ScriptError::AssertionFailed {
            ..
        })) => (Some("A script assertion rejected the resolved values".to_string()), None),
        Error::Match(e) if e.is_not_found() => {
            (Some("The rendered document lacks the element the matcher looks for".to_string()), None)
        }
        _ => (None, None),
    };

    let mut context = ErrorContext::new(error);
    context.suggestion = suggestion;
    context.details = details;
    context
}
