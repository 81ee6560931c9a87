//! Reading and classifying template sources for a single render.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{SourceKind, SourceText, TemplateSource};
use crate::config::RenderSettings;
use crate::matchers::FieldPath;
use crate::render::RenderError;
use crate::script::{ScriptLayer, ScriptProgram};
use crate::templating::directives::{Directive, ParsedTemplate, parse_directives};
use crate::templating::error::TemplateError;
use crate::values::flatten_overlay;

/// File extensions that always denote a script layer.
const SCRIPT_EXTENSIONS: &[&str] = &["star", "script"];

/// A base or patch template ready for substitution.
#[derive(Debug, Clone)]
pub(crate) struct LoadedTemplate {
    pub name: String,
    pub body: String,
    pub defaults: Vec<(String, String)>,
    /// Documents a patch applies to; empty means every document.
    pub selectors: Vec<(FieldPath, String)>,
}

#[derive(Debug, Clone)]
pub(crate) enum LoadedSource {
    Base(LoadedTemplate),
    Overlay {
        name: String,
        entries: Vec<(String, String)>,
    },
    Script(Arc<dyn ScriptLayer>),
    Patch(LoadedTemplate),
}

/// Read `source` and turn it into its loaded form.
pub(crate) fn load(
    source: &TemplateSource,
    settings: &RenderSettings,
) -> Result<LoadedSource, RenderError> {
    let (kind, text, namespace) = match source {
        TemplateSource::Transform(layer) => return Ok(LoadedSource::Script(Arc::clone(layer))),
        TemplateSource::Text {
            kind,
            text,
            namespace,
        } => (*kind, text, namespace.as_deref()),
    };

    let name = text.name();
    let content = read_text(text, settings)?;

    if kind == SourceKind::Script || (kind == SourceKind::Auto && is_script_name(&name)) {
        tracing::debug!("Loaded script layer '{}'", name);
        // Unparsable scripts are script errors, not template errors
        let program = ScriptProgram::parse(name, &content)?;
        return Ok(LoadedSource::Script(Arc::new(program)));
    }

    let parsed = parse_directives(&name, &content)?;
    let kind = match kind {
        SourceKind::Auto => parsed.implied_kind(),
        explicit => explicit,
    };
    parsed.check_kind(&name, kind)?;
    tracing::debug!("Loaded '{}' as {} template", name, kind);

    match kind {
        SourceKind::Overlay => {
            let namespace = namespace.or_else(|| parsed.namespace());
            let document: serde_yaml::Value =
                serde_yaml::from_str(&parsed.body).map_err(|e| TemplateError::InvalidYaml {
                    template: name.clone(),
                    message: e.to_string(),
                })?;
            let entries = flatten_overlay(&name, &document, namespace)?;
            Ok(LoadedSource::Overlay {
                name,
                entries,
            })
        }
        SourceKind::Patch => Ok(LoadedSource::Patch(into_template(name, parsed)?)),
        _ => Ok(LoadedSource::Base(into_template(name, parsed)?)),
    }
}

fn into_template(name: String, parsed: ParsedTemplate) -> Result<LoadedTemplate, TemplateError> {
    let defaults =
        parsed.defaults().map(|(key, value)| (key.to_string(), value.to_string())).collect();

    let mut selectors = Vec::new();
    for (line, directive) in &parsed.directives {
        if let Directive::Match {
            path,
            value,
        } = directive
        {
            let field = FieldPath::parse(path).map_err(|e| TemplateError::MalformedDirective {
                template: name.clone(),
                line: *line,
                message: e.to_string(),
            })?;
            selectors.push((field, value.clone()));
        }
    }

    Ok(LoadedTemplate {
        name,
        body: parsed.body,
        defaults,
        selectors,
    })
}

fn is_script_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Read the full text of a source, enforcing the configured size limit.
fn read_text(text: &SourceText, settings: &RenderSettings) -> Result<String, TemplateError> {
    match text {
        SourceText::Inline {
            name,
            content,
        } => {
            let size = content.len() as u64;
            if size > settings.max_template_size {
                return Err(TemplateError::TooLarge {
                    path: name.into(),
                    size,
                    limit: settings.max_template_size,
                });
            }
            Ok(content.clone())
        }
        SourceText::File(path) => {
            let unreadable = |source| TemplateError::Unreadable {
                path: path.clone(),
                source,
            };

            let size = fs::metadata(path).map_err(unreadable)?.len();
            if size > settings.max_template_size {
                return Err(TemplateError::TooLarge {
                    path: path.clone(),
                    size,
                    limit: settings.max_template_size,
                });
            }

            let content = fs::read_to_string(path).map_err(unreadable)?;
            tracing::trace!("Read {} bytes from {}", content.len(), path.display());
            Ok(content)
        }
    }
}
