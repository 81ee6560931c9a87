//! Placeholder substitution with Tera.
//!
//! [`TemplateRenderer`] owns the template context built from a resolved
//! [`Environment`] and renders template text against it. Parsing and
//! rendering are separate steps so that a broken template surfaces as a
//! [`TemplateError`] while a template that references an unknown variable
//! surfaces as a [`ResolutionError`].

use regex::Regex;
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::error::{ResolutionError, TemplateError};
use super::filters;
use crate::render::RenderError;
use crate::values::Environment;

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Renders template text against a fixed environment.
///
/// A fresh [`Tera`] instance is created per template, so no state leaks
/// between renders and the renderer itself can be shared freely.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    context: TeraContext,
    known_variables: Vec<String>,
}

impl TemplateRenderer {
    /// Build a renderer whose context is the nested form of `env`.
    pub fn new(env: &Environment) -> Result<Self, ResolutionError> {
        let nested = env.to_nested_json()?;

        let mut context = TeraContext::new();
        if let serde_json::Value::Object(map) = nested {
            for (key, value) in map {
                context.insert(key, &value);
            }
        }

        Ok(Self {
            context,
            known_variables: env.keys().map(str::to_string).collect(),
        })
    }

    /// Substitute every placeholder in `content`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::Syntax`] when the text is not a valid template
    /// - [`ResolutionError::VariableNotFound`] when a placeholder has neither
    ///   a value nor a default
    /// - [`ResolutionError::Evaluation`] for any other evaluation failure
    pub fn render(&self, template: &str, content: &str) -> Result<String, RenderError> {
        tracing::debug!("Rendering template '{}' ({} bytes)", template, content.len());

        let tera = Self::compile(template, content).map_err(|e| TemplateError::Syntax {
            template: template.to_string(),
            message: format_tera_error(&e, template),
            line: extract_line(&e),
        })?;

        let rendered = tera
            .render(template, &self.context)
            .map_err(|e| self.resolution_error(template, &e))?;

        tracing::debug!("Rendered '{}' ({} bytes)", template, rendered.len());
        Ok(rendered)
    }

    /// Render without classifying failures; script layers wrap the raw error.
    pub(crate) fn render_raw(&self, template: &str, content: &str) -> Result<String, String> {
        let tera = Self::compile(template, content).map_err(|e| format_tera_error(&e, template))?;
        tera.render(template, &self.context).map_err(|e| format_tera_error(&e, template))
    }

    fn compile(template: &str, content: &str) -> tera::Result<Tera> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        filters::register(&mut tera);
        tera.add_raw_template(template, content)?;
        Ok(tera)
    }

    fn resolution_error(&self, template: &str, error: &tera::Error) -> ResolutionError {
        match find_missing_variable(error) {
            Some(variable) => {
                let suggestions = find_similar_variables(&variable, &self.known_variables);
                ResolutionError::VariableNotFound {
                    variable,
                    template: template.to_string(),
                    line: extract_line(error),
                    suggestions,
                    available: self.known_variables.clone(),
                }
            }
            None => ResolutionError::Evaluation {
                template: template.to_string(),
                message: format_tera_error(error, template),
            },
        }
    }
}

/// Walk the error chain looking for Tera's "Variable `x` not found" message.
fn find_missing_variable(error: &tera::Error) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    error_chain(error).iter().find_map(|msg| {
        re.captures(msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    })
}

/// Find similar variable names using Levenshtein distance
fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> =
        available.iter().map(|var| (var.clone(), levenshtein(target, var))).collect();

    // Stable sort keeps alphabetical order between equal distances
    scored.sort_by_key(|(_, dist)| *dist);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(var, _)| var)
        .collect()
}

/// Extract line number from Tera's "line:column" markers.
fn extract_line(error: &tera::Error) -> Option<usize> {
    let re = Regex::new(r"(\d+):(\d+)").ok()?;
    error_chain(error).iter().find_map(|msg| {
        re.captures(msg).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
    })
}

fn error_chain(error: &tera::Error) -> Vec<String> {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages
}

/// Collapse a Tera error chain into one readable line.
///
/// Tera wraps the useful message in "Failed to render 'name'" layers; those
/// wrappers are dropped and the remaining messages joined.
pub fn format_tera_error(error: &tera::Error, template: &str) -> String {
    let while_rendering = format!("while rendering '{}'", template);
    let failed_render = format!("Failed to render '{}'", template);
    let failed_parse = format!("Failed to parse '{}'", template);

    let mut messages: Vec<String> = Vec::new();
    for msg in error_chain(error) {
        let cleaned = msg.replace(&while_rendering, "").trim().to_string();
        if cleaned.is_empty() || cleaned == failed_render || cleaned == failed_parse {
            continue;
        }
        if !messages.contains(&cleaned) {
            messages.push(cleaned);
        }
    }

    if messages.is_empty() {
        "template could not be processed".to_string()
    } else {
        messages.join(" -> ")
    }
}
