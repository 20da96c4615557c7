use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found; set the $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.vigil/` directory layout.
///
/// Use `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct VigilPaths {
    vigil_dir: PathBuf,
}

impl VigilPaths {
    /// Resolve paths from the user's home directory (`~/.vigil`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            vigil_dir: home.join(".vigil"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(vigil_dir: PathBuf) -> Self {
        Self { vigil_dir }
    }

    /// The base `~/.vigil` directory.
    pub fn vigil_dir(&self) -> &Path {
        &self.vigil_dir
    }

    /// Directory holding one file per cache key.
    pub fn cache_dir(&self) -> PathBuf {
        self.vigil_dir.join("cache")
    }

    pub fn user_config(&self) -> PathBuf {
        self.vigil_dir.join("config.toml")
    }

    /// Project-level config: `<project_root>/.vigil/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".vigil").join("config.toml")
    }
}
