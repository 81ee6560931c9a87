use thiserror::Error;

use crate::script::ScriptError;
use crate::templating::error::{ResolutionError, TemplateError};

/// Any failure that aborts a render. No partial document is produced.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}
