//! Crate-wide error handling.
//!
//! Most operations return their own error type: rendering yields
//! [`RenderError`](crate::render::RenderError), matching yields
//! [`MatchError`](crate::matchers::MatchError). The [`Error`] here wraps
//! both, with a [`Result`] alias defaulting to it.

pub mod error;

pub use error::{Error, ErrorContext, Result, user_friendly_error};
