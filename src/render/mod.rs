//! The rendering pipeline.
//!
//! A [`RenderingContext`] pairs a [`TemplateSourceSet`] with an
//! [`OverrideMap`] and turns them into a [`RenderedDocument`]. Variables are
//! resolved in strict precedence order, later layers winning on conflict:
//!
//! 1. `#@default` declarations of base and patch templates
//! 2. value overlays, in source-set order
//! 3. script layers, in source-set order, each seeing the previous result
//! 4. the override map
//!
//! Every base template is then substituted against the final environment and
//! parsed into documents, and patch templates are merged into the documents
//! they select.
//!
//! # Examples
//!
//! ```rust,no_run
//! use manifest_harness::render::RenderingContext;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RenderingContext::from_paths([
//!     "templates/deployment.yml",
//!     "templates/values/_values.yml",
//!     "templates/deployment.star",
//! ])
//! .with_data([("image", "cfidentity/uaa:dev")]);
//!
//! let rendered = ctx.render()?;
//! println!("{}", rendered);
//! # Ok(())
//! # }
//! ```

mod document;
mod error;

pub use document::{DOCUMENT_SEPARATOR, RenderedDocument};
pub use error::RenderError;

use std::path::PathBuf;

use crate::config::RenderSettings;
use crate::source::loader::{self, LoadedSource, LoadedTemplate};
use crate::source::{TemplateSource, TemplateSourceSet};
use crate::templating::TemplateRenderer;
use crate::templating::error::TemplateError;
use crate::values::{Environment, OverrideMap, deep_merge_yaml, scalar_text};

/// Caller-facing handle for rendering one scenario.
///
/// Contexts are plain values. Builder methods return a new context, so a
/// shared base context can be specialised per test without affecting others.
#[derive(Debug, Clone, Default)]
pub struct RenderingContext {
    sources: TemplateSourceSet,
    overrides: OverrideMap,
    settings: RenderSettings,
}

impl RenderingContext {
    /// Create a context over `sources` with no overrides and default settings.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use manifest_harness::source::SourceKind;
    /// use manifest_harness::{RenderingContext, TemplateSource, TemplateSourceSet};
    ///
    /// let sources: TemplateSourceSet = [
    ///     TemplateSource::inline(SourceKind::Base, "cm.yml", "kind: ConfigMap\ndata:\n  image: \"{{ image }}\"\n"),
    ///     TemplateSource::inline(SourceKind::Overlay, "values.yml", "image: uaa:1\n"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let rendered = RenderingContext::new(sources).with_data([("image", "uaa:2")]).render()?;
    /// let config_map = rendered.find_by_kind("ConfigMap").unwrap();
    /// assert_eq!(config_map["data"]["image"].as_str(), Some("uaa:2"));
    /// # Ok::<(), manifest_harness::render::RenderError>(())
    /// ```
    pub fn new(sources: impl Into<TemplateSourceSet>) -> Self {
        Self {
            sources: sources.into(),
            ..Self::default()
        }
    }

    /// Context over auto-detected template files, in the order given.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(TemplateSourceSet::from_paths(paths))
    }

    /// Return a context with `data` applied on top of the current overrides.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<OverrideMap>) -> Self {
        self.overrides = self.overrides.merged(data.into());
        self
    }

    /// Return a context with `source` appended to the source set.
    #[must_use]
    pub fn with_source(mut self, source: TemplateSource) -> Self {
        self.sources = self.sources.with(source);
        self
    }

    /// Return a context using `settings` for every render.
    #[must_use]
    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The template sources, in precedence order.
    pub fn sources(&self) -> &TemplateSourceSet {
        &self.sources
    }

    /// Values applied after every template layer.
    pub fn overrides(&self) -> &OverrideMap {
        &self.overrides
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Resolve the final variable environment without rendering any template.
    ///
    /// # Errors
    ///
    /// Fails like [`RenderingContext::render`] for every stage up to and
    /// including the override layer.
    pub fn resolve_environment(&self) -> Result<Environment, RenderError> {
        let loaded = self.load()?;
        self.build_environment(&loaded)
    }

    /// Render the source set into a document.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Template`] when a source is missing or malformed, or
    ///   when the set has no base template
    /// - [`RenderError::Resolution`] when a placeholder cannot be resolved
    /// - [`RenderError::Script`] when a script layer fails
    pub fn render(&self) -> Result<RenderedDocument, RenderError> {
        let loaded = self.load()?;
        let env = self.build_environment(&loaded)?;
        let renderer = TemplateRenderer::new(&env)?;

        let mut documents = Vec::new();
        for source in &loaded {
            if let LoadedSource::Base(template) = source {
                let text = renderer.render(&template.name, &template.body)?;
                let parsed = document::parse_documents(&template.name, &text)?;
                tracing::debug!("'{}' produced {} document(s)", template.name, parsed.len());
                documents.extend(parsed);
            }
        }

        for source in &loaded {
            if let LoadedSource::Patch(template) = source {
                apply_patch(&renderer, template, &mut documents)?;
            }
        }

        tracing::debug!("Render complete: {} document(s)", documents.len());
        Ok(RenderedDocument::from_documents(documents))
    }

    fn load(&self) -> Result<Vec<LoadedSource>, RenderError> {
        tracing::debug!("Loading {} template source(s)", self.sources.len());
        let loaded = self
            .sources
            .iter()
            .map(|source| loader::load(source, &self.settings))
            .collect::<Result<Vec<_>, _>>()?;

        if !loaded.iter().any(|source| matches!(source, LoadedSource::Base(_))) {
            return Err(TemplateError::NoBaseTemplate.into());
        }
        Ok(loaded)
    }

    fn build_environment(&self, loaded: &[LoadedSource]) -> Result<Environment, RenderError> {
        let mut env = Environment::new();

        for source in loaded {
            if let LoadedSource::Base(template) | LoadedSource::Patch(template) = source {
                env.extend(template.defaults.iter().cloned());
            }
        }
        tracing::debug!("{} built-in default(s)", env.len());

        for source in loaded {
            if let LoadedSource::Overlay {
                name,
                entries,
            } = source
            {
                tracing::debug!("Applying value overlay '{}' ({} entries)", name, entries.len());
                env.extend(entries.iter().cloned());
            }
        }

        for source in loaded {
            if let LoadedSource::Script(layer) = source {
                tracing::debug!("Running script layer '{}'", layer.name());
                env = layer.transform(&env)?;
            }
        }

        for (key, value) in self.overrides.iter() {
            if !env.contains(key) {
                tracing::warn!("Override '{}' does not replace any defined variable", key);
            }
            env.insert(key, value);
        }

        for (key, value) in env.iter() {
            tracing::trace!("{} = {}", key, value);
        }
        Ok(env)
    }
}

/// Render a patch template and merge it into every document it selects.
fn apply_patch(
    renderer: &TemplateRenderer,
    template: &LoadedTemplate,
    documents: &mut [serde_yaml::Value],
) -> Result<(), RenderError> {
    let text = renderer.render(&template.name, &template.body)?;
    let mut parsed = document::parse_documents(&template.name, &text)?;
    let patch = match (parsed.pop(), parsed.is_empty()) {
        (Some(patch), true) if patch.is_mapping() => patch,
        _ => {
            return Err(TemplateError::PatchNotMapping {
                template: template.name.clone(),
            }
            .into());
        }
    };

    let mut applied = 0;
    for document in documents.iter_mut() {
        let selected = template.selectors.iter().all(|(path, expected)| {
            path.resolve(&*document)
                .ok()
                .and_then(scalar_text)
                .is_some_and(|actual| &actual == expected)
        });
        if selected {
            deep_merge_yaml(document, &patch);
            applied += 1;
        }
    }

    tracing::debug!("Patch '{}' applied to {} document(s)", template.name, applied);
    Ok(())
}
