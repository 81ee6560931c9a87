//! Temporary template directories.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fixtures::TemplateFixture;
use crate::render::RenderingContext;

/// A temporary directory of template files, removed on drop.
pub struct TemplateDir {
    pub temp_dir: TempDir,
}

impl TemplateDir {
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Create a directory holding `fixtures`.
    pub fn with_fixtures(fixtures: &[TemplateFixture]) -> Result<Self> {
        let dir = Self::new()?;
        for fixture in fixtures {
            fixture.write_to(dir.path())?;
        }
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_file(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        TemplateFixture::new(path.as_ref().to_string_lossy(), content).write_to(self.path())
    }

    /// Rendering context over files in this directory, in the order given.
    pub fn context<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> RenderingContext {
        RenderingContext::from_paths(paths.into_iter().map(|p| self.path().join(p)))
    }
}
