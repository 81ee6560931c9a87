//! `#@` directive lines embedded in template sources.
//!
//! Directives are comment lines, so a template stays valid YAML for editors
//! and linters. They are stripped before substitution and replaced by blank
//! lines, which keeps line numbers in later error messages accurate.
//!
//! ```yaml
//! #@default resources.requests.memory: 512Mi
//! apiVersion: apps/v1
//! kind: Deployment
//! ```

use serde_yaml::Value;

use super::error::TemplateError;
use crate::source::SourceKind;
use crate::values::scalar_text;

/// A single parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `#@data/values` marks a value overlay.
    DataValues,
    /// `#@namespace <prefix>` prefixes every key of a value overlay.
    Namespace(String),
    /// `#@default <key>: <value>` declares a built-in default.
    Default { key: String, value: String },
    /// `#@patch` marks a patch template.
    Patch,
    /// `#@match <path>=<value>` restricts which documents a patch touches.
    Match { path: String, value: String },
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::DataValues => "data/values",
            Directive::Namespace(_) => "namespace",
            Directive::Default { .. } => "default",
            Directive::Patch => "patch",
            Directive::Match { .. } => "match",
        }
    }

    fn allowed_in(&self, kind: SourceKind) -> bool {
        match self {
            Directive::DataValues | Directive::Namespace(_) => kind == SourceKind::Overlay,
            Directive::Default { .. } => matches!(kind, SourceKind::Base | SourceKind::Patch),
            Directive::Patch | Directive::Match { .. } => kind == SourceKind::Patch,
        }
    }
}

/// Template text with its directives separated out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// Text with every directive line blanked.
    pub body: String,
    /// Directives with their 1-based line numbers, in file order.
    pub directives: Vec<(usize, Directive)>,
}

impl ParsedTemplate {
    pub fn has(&self, wanted: &Directive) -> bool {
        self.directives.iter().any(|(_, d)| d == wanted)
    }

    /// Kind implied by marker directives, used for auto detection.
    pub fn implied_kind(&self) -> SourceKind {
        if self.has(&Directive::DataValues) {
            SourceKind::Overlay
        } else if self.has(&Directive::Patch) {
            SourceKind::Patch
        } else {
            SourceKind::Base
        }
    }

    /// Reject directives that make no sense for `kind`.
    pub fn check_kind(&self, template: &str, kind: SourceKind) -> Result<(), TemplateError> {
        match self.directives.iter().find(|(_, d)| !d.allowed_in(kind)) {
            Some((_, directive)) => Err(TemplateError::MisplacedDirective {
                template: template.to_string(),
                directive: directive.name().to_string(),
                kind,
            }),
            None => Ok(()),
        }
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directives.iter().filter_map(|(_, d)| match d {
            Directive::Default {
                key,
                value,
            } => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// The last `#@namespace` directive, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.directives.iter().rev().find_map(|(_, d)| match d {
            Directive::Namespace(ns) => Some(ns.as_str()),
            _ => None,
        })
    }

    pub fn selectors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directives.iter().filter_map(|(_, d)| match d {
            Directive::Match {
                path,
                value,
            } => Some((path.as_str(), value.as_str())),
            _ => None,
        })
    }
}

/// Split `content` into body text and directives.
pub fn parse_directives(template: &str, content: &str) -> Result<ParsedTemplate, TemplateError> {
    let mut body = String::with_capacity(content.len());
    let mut directives = Vec::new();

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let Some(rest) = line.trim_start().strip_prefix("#@") else {
            body.push_str(line);
            continue;
        };

        let line_number = idx + 1;
        let rest = rest.trim();
        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        directives.push((line_number, parse_one(template, line_number, name, argument)?));

        if line.ends_with('\n') {
            body.push('\n');
        }
    }

    tracing::debug!("Parsed {} directive(s) from '{}'", directives.len(), template);
    Ok(ParsedTemplate {
        body,
        directives,
    })
}

fn parse_one(
    template: &str,
    line: usize,
    name: &str,
    argument: &str,
) -> Result<Directive, TemplateError> {
    let malformed = |message: &str| TemplateError::MalformedDirective {
        template: template.to_string(),
        line,
        message: message.to_string(),
    };

    match name {
        "data/values" | "patch" if !argument.is_empty() => {
            Err(malformed(&format!("'#@{}' takes no argument", name)))
        }
        "data/values" => Ok(Directive::DataValues),
        "patch" => Ok(Directive::Patch),
        "namespace" => {
            if !is_dotted_key(argument) {
                return Err(malformed("expected '#@namespace <dotted.prefix>'"));
            }
            Ok(Directive::Namespace(argument.to_string()))
        }
        "default" => {
            let (key, raw) =
                argument.split_once(':').ok_or_else(|| malformed("expected '#@default <key>: <value>'"))?;
            let key = key.trim();
            if !is_dotted_key(key) {
                return Err(malformed(&format!("invalid variable name '{}'", key)));
            }
            let value = parse_scalar(raw.trim())
                .ok_or_else(|| malformed("default values must be scalars"))?;
            Ok(Directive::Default {
                key: key.to_string(),
                value,
            })
        }
        "match" => {
            let (path, raw) = split_outside_brackets(argument, '=')
                .ok_or_else(|| malformed("expected '#@match <path>=<value>'"))?;
            let path = path.trim();
            if path.is_empty() {
                return Err(malformed("match path is empty"));
            }
            let value =
                parse_scalar(raw.trim()).ok_or_else(|| malformed("match values must be scalars"))?;
            Ok(Directive::Match {
                path: path.to_string(),
                value,
            })
        }
        _ => Err(TemplateError::UnknownDirective {
            template: template.to_string(),
            directive: name.to_string(),
            line,
        }),
    }
}

fn is_dotted_key(key: &str) -> bool {
    !key.is_empty() && key.split('.').all(|segment| !segment.trim().is_empty())
}

/// Split at the first `delimiter` not inside `[...]`, so selector paths such as
/// `containers[name=uaa].image` keep their own `=`.
fn split_outside_brackets(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == delimiter && depth == 0 => return Some((&text[..idx], &text[idx + c.len_utf8()..])),
            _ => {}
        }
    }
    None
}

/// Parse a YAML scalar, so `'512Mi'`, `"y"` and `512Mi` all read the same.
fn parse_scalar(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return Some(String::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Null) => Some(String::new()),
        Ok(value) => scalar_text(&value),
        Err(_) => Some(raw.to_string()),
    }
}
