//! Small template fixtures for tests that need files on disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A template file: its path relative to a fixture directory, and its text.
#[derive(Clone, Debug)]
pub struct TemplateFixture {
    pub path: String,
    pub content: String,
}

impl TemplateFixture {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// ConfigMap base template with a `greeting` default and a required `name`.
    pub fn config_map() -> Self {
        Self::new(
            "configmap.yml",
            r#"#@default greeting: hello
apiVersion: v1
kind: ConfigMap
metadata:
  name: "{{ name }}"
data:
  greeting: "{{ greeting }}"
"#,
        )
    }

    /// Value overlay defining each `(key, value)` pair at the top level.
    pub fn values<'a>(path: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut content = String::from("#@data/values\n");
        for (key, value) in pairs {
            content.push_str(&format!("{}: {:?}\n", key, value));
        }
        Self::new(path, content)
    }

    /// Script layer in step-list form.
    pub fn script(path: &str, steps: &str) -> Self {
        Self::new(path, steps)
    }

    /// Patch template applied to documents of `kind`.
    pub fn patch_for_kind(path: &str, kind: &str, body: &str) -> Self {
        Self::new(path, format!("#@patch\n#@match kind={}\n{}", kind, body))
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        Ok(path)
    }
}
