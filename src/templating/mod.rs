//! Tera-based placeholder substitution for manifest templates.
//!
//! Templates are YAML text containing Tera expressions. Variables come from the
//! resolved [`Environment`](crate::values::Environment), where dotted keys are
//! exposed as nested objects:
//!
//! ```yaml
//! #@default resources.requests.memory: 512Mi
//! resources:
//!   requests:
//!     memory: "{{ resources.requests.memory }}"
//!     cpu: "{{ resources.requests.cpu | default(value='500m') }}"
//! ```
//!
//! # Supported Features
//!
//! - Variable substitution: `{{ image }}`
//! - Placeholder defaults: `{{ tag | default(value="latest") }}`
//! - Conditional logic: `{% if database.scheme == "hsqldb" %}...{% endif %}`
//! - Standard Tera filters, plus `sha256` (see [`filters`])
//! - `#@` directives (see [`directives`])
//!
//! Values are substituted as opaque strings. Any typing (`512Mi` as a
//! quantity, `2` as an integer) happens when the substituted text is parsed
//! as YAML.

pub mod directives;
pub mod error;
pub mod filters;
pub mod renderer;

pub use error::{ResolutionError, TemplateError};
pub use renderer::{TemplateRenderer, format_tera_error};
