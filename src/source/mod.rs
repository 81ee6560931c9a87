//! Template sources and the ordered set they form.
//!
//! A [`TemplateSourceSet`] lists everything that goes into one render, in
//! precedence order. Each [`TemplateSource`] is either text (a file on disk or
//! an inline string) with a [`SourceKind`], or a programmatic
//! [`ScriptLayer`].
//!
//! Files are not touched when a set is built. They are opened, read fully and
//! closed during each render, so a set can be shared by many
//! rendering contexts and always reflects the files as they are at render
//! time.

pub(crate) mod loader;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::script::ScriptLayer;

/// Role a template source plays in a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Decide from extension and marker directives when the file is loaded.
    #[default]
    Auto,
    /// Manifest skeleton with placeholders.
    Base,
    /// Default variable values.
    Overlay,
    /// Environment transform run after overlays.
    Script,
    /// Template deep-merged into matching rendered documents.
    Patch,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Auto => "auto",
            SourceKind::Base => "base",
            SourceKind::Overlay => "overlay",
            SourceKind::Script => "script",
            SourceKind::Patch => "patch",
        };
        f.write_str(name)
    }
}

/// Where the text of a source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    File(PathBuf),
    Inline { name: String, content: String },
}

impl SourceText {
    /// Short display name: the file name, or the inline name.
    pub fn name(&self) -> String {
        match self {
            SourceText::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            SourceText::Inline {
                name,
                ..
            } => name.clone(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceText::File(path) => Some(path),
            SourceText::Inline {
                ..
            } => None,
        }
    }
}

/// One entry of a [`TemplateSourceSet`].
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Text {
        kind: SourceKind,
        text: SourceText,
        /// Explicit namespace for overlays; wins over a `#@namespace` directive.
        namespace: Option<String>,
    },
    Transform(Arc<dyn ScriptLayer>),
}

impl TemplateSource {
    fn text(kind: SourceKind, text: SourceText) -> Self {
        TemplateSource::Text {
            kind,
            text,
            namespace: None,
        }
    }

    /// A file whose kind is detected when it is loaded.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::text(SourceKind::Auto, SourceText::File(path.into()))
    }

    /// A base template file, whatever its header says.
    pub fn base(path: impl Into<PathBuf>) -> Self {
        Self::text(SourceKind::Base, SourceText::File(path.into()))
    }

    /// A value overlay file.
    pub fn overlay(path: impl Into<PathBuf>) -> Self {
        Self::text(SourceKind::Overlay, SourceText::File(path.into()))
    }

    /// An overlay whose keys are all placed under `namespace`.
    pub fn overlay_in(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        TemplateSource::Text {
            kind: SourceKind::Overlay,
            text: SourceText::File(path.into()),
            namespace: Some(namespace.into()),
        }
    }

    /// A script layer file, whatever its extension.
    pub fn script(path: impl Into<PathBuf>) -> Self {
        Self::text(SourceKind::Script, SourceText::File(path.into()))
    }

    /// A patch template file.
    pub fn patch(path: impl Into<PathBuf>) -> Self {
        Self::text(SourceKind::Patch, SourceText::File(path.into()))
    }

    /// A source whose text is held in memory.
    ///
    /// Inline text is held to the same `max_template_size` as files.
    pub fn inline(kind: SourceKind, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::text(
            kind,
            SourceText::Inline {
                name: name.into(),
                content: content.into(),
            },
        )
    }

    /// A programmatic script layer.
    pub fn transform(layer: impl ScriptLayer + 'static) -> Self {
        TemplateSource::Transform(Arc::new(layer))
    }

    /// Set the overlay namespace of a text source. Transforms are returned unchanged.
    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        match self {
            TemplateSource::Text {
                kind,
                text,
                ..
            } => TemplateSource::Text {
                kind,
                text,
                namespace: Some(namespace.into()),
            },
            transform => transform,
        }
    }

    /// Display name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            TemplateSource::Text {
                text,
                ..
            } => text.name(),
            TemplateSource::Transform(layer) => layer.name().to_string(),
        }
    }
}

/// Ordered template sources; later entries take precedence within a layer.
#[derive(Debug, Clone, Default)]
pub struct TemplateSourceSet {
    sources: Vec<TemplateSource>,
}

impl TemplateSourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of auto-detected files, in the order given.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().map(TemplateSource::file).collect()
    }

    /// Return a copy of this set with `source` appended.
    #[must_use]
    pub fn with(mut self, source: TemplateSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Sources in the order they were added.
    pub fn iter(&self) -> std::slice::Iter<'_, TemplateSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<TemplateSource> for TemplateSourceSet {
    fn from_iter<I: IntoIterator<Item = TemplateSource>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl Extend<TemplateSource> for TemplateSourceSet {
    fn extend<I: IntoIterator<Item = TemplateSource>>(&mut self, iter: I) {
        self.sources.extend(iter);
    }
}

impl From<Vec<TemplateSource>> for TemplateSourceSet {
    fn from(sources: Vec<TemplateSource>) -> Self {
        Self {
            sources,
        }
    }
}

impl<'a> IntoIterator for &'a TemplateSourceSet {
    type Item = &'a TemplateSource;
    type IntoIter = std::slice::Iter<'a, TemplateSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
