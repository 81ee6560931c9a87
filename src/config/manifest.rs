//! `render.toml`: a rendering scenario described on disk.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::parser::parse_config;
use super::settings::RenderSettings;
use crate::render::RenderingContext;
use crate::source::{SourceKind, TemplateSource, TemplateSourceSet};
use crate::values::OverrideMap;

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    /// Relative paths are resolved against the manifest's directory.
    pub path: PathBuf,
    #[serde(default)]
    pub kind: SourceKind,
    /// Overlays only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A template source set, its override map and settings, read from TOML.
///
/// ```toml
/// [settings]
/// max_template_size = 1048576
///
/// [[sources]]
/// path = "deployment.yml"
///
/// [[sources]]
/// path = "values/database.yml"
/// kind = "overlay"
/// namespace = "database"
///
/// [overrides]
/// "database.scheme" = "postgresql"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderManifest {
    #[serde(default)]
    pub settings: RenderSettings,

    #[serde(default)]
    pub sources: Vec<SourceEntry>,

    #[serde(default)]
    pub overrides: OverrideMap,

    /// Directory relative source paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl RenderManifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut manifest: Self = parse_config(path, "render manifest")?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        manifest.validate().map_err(|e| e.context(format!("Invalid render manifest: {}", path.display())))?;
        tracing::debug!("Loaded render manifest {} ({} source(s))", path.display(), manifest.sources.len());
        Ok(manifest)
    }

    /// Parse manifest text whose relative paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: Self = toml::from_str(content)?;
        manifest.base_dir = base_dir.into();
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("At least one [[sources]] entry is required");
        }
        if self.settings.max_template_size == 0 {
            bail!("settings.max_template_size must be greater than zero");
        }
        for entry in &self.sources {
            if entry.path.as_os_str().is_empty() {
                bail!("Source path must not be empty");
            }
            if entry.namespace.is_some() && !matches!(entry.kind, SourceKind::Auto | SourceKind::Overlay) {
                bail!(
                    "Source '{}' has a namespace but is a {} template; only overlays take a namespace",
                    entry.path.display(),
                    entry.kind
                );
            }
        }
        Ok(())
    }

    pub fn source_set(&self) -> TemplateSourceSet {
        self.sources
            .iter()
            .map(|entry| {
                let path = self.base_dir.join(&entry.path);
                let source = match entry.kind {
                    SourceKind::Auto => TemplateSource::file(path),
                    SourceKind::Base => TemplateSource::base(path),
                    SourceKind::Overlay => TemplateSource::overlay(path),
                    SourceKind::Script => TemplateSource::script(path),
                    SourceKind::Patch => TemplateSource::patch(path),
                };
                match &entry.namespace {
                    Some(namespace) => source.with_namespace(namespace.clone()),
                    None => source,
                }
            })
            .collect()
    }

    pub fn into_context(self) -> RenderingContext {
        RenderingContext::new(self.source_set()).with_settings(self.settings).with_data(self.overrides)
    }
}
