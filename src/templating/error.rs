//! Error types for template loading and placeholder resolution.
//!
//! Rendering can fail in two distinct ways and the types mirror that:
//! - [`TemplateError`] - a template could not be found, read or parsed
//! - [`ResolutionError`] - a template parsed, but a placeholder has no value
//!
//! Both are fatal for the render that raised them.

use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceKind;

/// A template source is missing, unreadable or malformed.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{}' could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template '{}' is {size} bytes, exceeding the limit of {limit} bytes", path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("Template syntax error in '{template}': {message}")]
    Syntax {
        template: String,
        message: String,
        line: Option<usize>,
    },

    #[error("Unknown directive '#@{directive}' in '{template}' at line {line}")]
    UnknownDirective {
        template: String,
        directive: String,
        line: usize,
    },

    #[error("Malformed directive in '{template}' at line {line}: {message}")]
    MalformedDirective {
        template: String,
        line: usize,
        message: String,
    },

    #[error("Directive '#@{directive}' is not allowed in {kind} template '{template}'")]
    MisplacedDirective {
        template: String,
        directive: String,
        kind: SourceKind,
    },

    #[error("'{template}' is not valid YAML: {message}")]
    InvalidYaml {
        template: String,
        message: String,
    },

    #[error("Value overlay '{template}' must contain a mapping")]
    OverlayNotMapping {
        template: String,
    },

    #[error("Value overlay '{template}' has an unsupported value at '{key}': {reason}")]
    UnsupportedValue {
        template: String,
        key: String,
        reason: &'static str,
    },

    #[error("Patch template '{template}' must render to exactly one mapping")]
    PatchNotMapping {
        template: String,
    },

    #[error("Template source set contains no base template")]
    NoBaseTemplate,
}

/// A placeholder could not be resolved against the final environment.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Template variable not found: '{variable}' in '{template}'")]
    VariableNotFound {
        variable: String,
        template: String,
        line: Option<usize>,
        suggestions: Vec<String>,
        available: Vec<String>,
    },

    #[error("Failed to evaluate '{template}': {message}")]
    Evaluation {
        template: String,
        message: String,
    },

    #[error("Variable '{key}' conflicts with '{other}': a value cannot also hold nested values")]
    ConflictingKeys {
        key: String,
        other: String,
    },

    #[error("Invalid variable name '{key}'")]
    InvalidKey {
        key: String,
    },
}

impl ResolutionError {
    /// Multi-line diagnostic with suggestions, for test failure output.
    pub fn format_with_context(&self) -> String {
        match self {
            ResolutionError::VariableNotFound {
                variable,
                template,
                line,
                suggestions,
                available,
            } => format_variable_not_found(variable, template, *line, suggestions, available),
            other => format!("ERROR: {}\n", other),
        }
    }
}

fn format_variable_not_found(
    variable: &str,
    template: &str,
    line: Option<usize>,
    suggestions: &[String],
    available: &[String],
) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {}\n", variable));
    msg.push_str(&format!("Template: {}\n", template));
    if let Some(line) = line {
        msg.push_str(&format!("Line: {}\n", line));
    }
    msg.push('\n');

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {}\n", suggestion));
        }
        msg.push('\n');
    }

    if !available.is_empty() {
        msg.push_str("Available variables:\n");

        // Group by first segment so large environments stay readable
        let mut grouped = std::collections::BTreeMap::new();
        for var in available {
            let prefix = var.split('.').next().unwrap_or(var);
            grouped.entry(prefix).or_insert_with(Vec::new).push(var.as_str());
        }

        for (prefix, vars) in grouped.iter().take(8) {
            if vars.len() <= 3 {
                for var in vars {
                    msg.push_str(&format!("  {}\n", var));
                }
            } else {
                msg.push_str(&format!("  {}.*  ({} variables)\n", prefix, vars.len()));
            }
        }
        if grouped.len() > 8 {
            msg.push_str(&format!("  ... and {} more\n", grouped.len() - 8));
        }
        msg.push('\n');
    }

    msg.push_str("SUGGESTION: Define the variable in a value overlay, pass it as an override,\n");
    msg.push_str("or give the placeholder a default: {{ name | default(value=\"...\") }}\n");

    msg
}
