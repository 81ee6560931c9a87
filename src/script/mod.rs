//! Script layers: pure environment transforms run before overrides.
//!
//! A script layer computes derived defaults (for example an image reference
//! built from a repository and a digest) without baking branching logic into
//! the base template. Every layer implements [`ScriptLayer`], which takes an
//! immutable environment snapshot and returns a new one, so a layer cannot
//! reach ambient state and the render stays deterministic.
//!
//! [`ScriptProgram`] is the file-based layer. Its source is a YAML list of
//! steps whose values are Tera templates:
//!
//! ```yaml
//! - default:
//!     image: "{{ image_repository }}@sha256:{{ image_digest }}"
//! - set:
//!     spring_profiles: "{% if database.scheme == 'hsqldb' %}default,hsqldb{% else %}{{ database.scheme }}{% endif %}"
//! - unset: [image_digest]
//! - assert:
//!     that: "resources.requests.memory is ending_with('Mi')"
//!     message: memory requests must be expressed in Mi
//! ```
//!
//! All entries of one step are evaluated against the environment as it was
//! when the step started, then written together.

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::templating::TemplateRenderer;
use crate::values::{Environment, scalar_text};

/// A script layer failed; rendering stops.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script '{script}' could not be parsed: {message}")]
    Parse {
        script: String,
        message: String,
    },

    #[error("Script '{script}' failed at step {step}: {message}")]
    Evaluation {
        script: String,
        step: usize,
        message: String,
    },

    #[error("Script '{script}' assertion failed at step {step}: {message}")]
    AssertionFailed {
        script: String,
        step: usize,
        message: String,
    },

    #[error("Script '{script}' failed: {message}")]
    Failed {
        script: String,
        message: String,
    },
}

/// A pure transform from one variable environment to the next.
///
/// Implementations must not depend on anything but `env`; the render
/// pipeline relies on identical input producing identical output.
pub trait ScriptLayer: fmt::Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn transform(&self, env: &Environment) -> Result<Environment, ScriptError>;
}

/// One instruction of a [`ScriptProgram`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Write every key.
    Set(BTreeMap<String, String>),
    /// Write keys that are not defined yet.
    Default(BTreeMap<String, String>),
    /// Remove keys.
    Unset(Vec<String>),
    /// Fail unless the Tera expression `that` is truthy.
    Assert { that: String, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    set: Option<BTreeMap<String, Value>>,
    default: Option<BTreeMap<String, Value>>,
    unset: Option<Vec<String>>,
    assert: Option<RawAssert>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAssert {
    that: String,
    message: Option<String>,
}

/// A script layer parsed from step-list source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptProgram {
    name: String,
    steps: Vec<ScriptStep>,
}

impl ScriptProgram {
    /// Parse a program. Empty text yields a program that changes nothing.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, ScriptError> {
        let name = name.into();
        let parse_error = |message: String| ScriptError::Parse {
            script: name.clone(),
            message,
        };

        let document: Value =
            serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        if document.is_null() {
            return Ok(Self {
                name,
                steps: Vec::new(),
            });
        }

        let raw_steps: Vec<RawStep> =
            serde_yaml::from_value(document).map_err(|e| parse_error(e.to_string()))?;

        let mut steps = Vec::with_capacity(raw_steps.len());
        for (idx, raw) in raw_steps.into_iter().enumerate() {
            steps.push(Self::convert(raw).map_err(|message| {
                parse_error(format!("step {}: {}", idx + 1, message))
            })?);
        }

        tracing::debug!("Parsed script '{}' with {} step(s)", name, steps.len());
        Ok(Self {
            name,
            steps,
        })
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    fn convert(raw: RawStep) -> Result<ScriptStep, String> {
        let RawStep {
            set,
            default,
            unset,
            assert,
        } = raw;

        let mut found = Vec::new();
        if let Some(entries) = set {
            found.push(ScriptStep::Set(Self::templates(entries)?));
        }
        if let Some(entries) = default {
            found.push(ScriptStep::Default(Self::templates(entries)?));
        }
        if let Some(keys) = unset {
            found.push(ScriptStep::Unset(keys));
        }
        if let Some(RawAssert {
            that,
            message,
        }) = assert
        {
            let message = message.unwrap_or_else(|| format!("expected {}", that));
            found.push(ScriptStep::Assert {
                that,
                message,
            });
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err("expected one of set, default, unset, assert".to_string()),
            _ => Err("a step may only contain one instruction".to_string()),
        }
    }

    fn templates(entries: BTreeMap<String, Value>) -> Result<BTreeMap<String, String>, String> {
        entries
            .into_iter()
            .map(|(key, value)| match value {
                Value::Null => Ok((key, String::new())),
                other => scalar_text(&other)
                    .map(|text| (key.clone(), text))
                    .ok_or_else(|| format!("value of '{}' must be a scalar", key)),
            })
            .collect()
    }

    fn evaluate_all(
        &self,
        step: usize,
        renderer: &TemplateRenderer,
        entries: &BTreeMap<String, String>,
    ) -> Result<Vec<(String, String)>, ScriptError> {
        entries
            .iter()
            .map(|(key, template)| {
                let label = format!("{}#{}", self.name, key);
                renderer
                    .render_raw(&label, template)
                    .map(|value| (key.clone(), value))
                    .map_err(|message| ScriptError::Evaluation {
                        script: self.name.clone(),
                        step,
                        message,
                    })
            })
            .collect()
    }

    fn renderer(&self, step: usize, env: &Environment) -> Result<TemplateRenderer, ScriptError> {
        TemplateRenderer::new(env).map_err(|e| ScriptError::Evaluation {
            script: self.name.clone(),
            step,
            message: e.to_string(),
        })
    }
}

impl ScriptLayer for ScriptProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, input: &Environment) -> Result<Environment, ScriptError> {
        let mut env = input.clone();

        for (idx, step) in self.steps.iter().enumerate() {
            let number = idx + 1;
            match step {
                ScriptStep::Set(entries) => {
                    let values = self.evaluate_all(number, &self.renderer(number, &env)?, entries)?;
                    for (key, value) in values {
                        tracing::trace!("{}: set {} = {}", self.name, key, value);
                        env.insert(key, value);
                    }
                }
                ScriptStep::Default(entries) => {
                    let pending: BTreeMap<String, String> = entries
                        .iter()
                        .filter(|(key, _)| !env.contains(key))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    let values = self.evaluate_all(number, &self.renderer(number, &env)?, &pending)?;
                    for (key, value) in values {
                        tracing::trace!("{}: default {} = {}", self.name, key, value);
                        env.insert(key, value);
                    }
                }
                ScriptStep::Unset(keys) => {
                    for key in keys {
                        env.remove(key);
                    }
                }
                ScriptStep::Assert {
                    that,
                    message,
                } => {
                    let probe = format!("{{% if {} %}}true{{% else %}}false{{% endif %}}", that);
                    let label = format!("{}#assert", self.name);
                    let outcome = self
                        .renderer(number, &env)?
                        .render_raw(&label, &probe)
                        .map_err(|message| ScriptError::Evaluation {
                            script: self.name.clone(),
                            step: number,
                            message,
                        })?;
                    if outcome != "true" {
                        return Err(ScriptError::AssertionFailed {
                            script: self.name.clone(),
                            step: number,
                            message: message.clone(),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "Script '{}' produced {} variable(s) from {}",
            self.name,
            env.len(),
            input.len()
        );
        Ok(env)
    }
}
