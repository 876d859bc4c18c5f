// Platform specific application directories

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Application name used for all directories and default file names
pub const APP_NAME: &str = "hamster_cli";

/// Per-user application directories.
///
/// Directories are created on access unless `create` is turned off.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
    pub create: bool,
}

impl AppDirs {
    /// Resolve the platform directories for `appname`
    pub fn new(appname: &str) -> Result<Self> {
        let config_base = dirs::config_dir()
            .context("Unable to determine the user configuration directory")?;
        let data_base = dirs::data_dir()
            .context("Unable to determine the user data directory")?;
        let cache_base = dirs::cache_dir()
            .context("Unable to determine the user cache directory")?;

        Ok(Self {
            config_dir: config_base.join(appname),
            data_dir: data_base.join(appname),
            cache_dir: cache_base.join(appname),
            create: true,
        })
    }

    /// All directories below a single root (`<root>/config`, `<root>/data`, ...)
    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
            create: true,
        }
    }

    pub fn user_config_dir(&self) -> Result<PathBuf> {
        self.ensure(&self.config_dir)
    }

    pub fn user_data_dir(&self) -> Result<PathBuf> {
        self.ensure(&self.data_dir)
    }

    pub fn user_cache_dir(&self) -> Result<PathBuf> {
        self.ensure(&self.cache_dir)
    }

    pub fn user_log_dir(&self) -> Result<PathBuf> {
        self.ensure(&self.cache_dir.join("log"))
    }

    fn ensure(&self, dir: &Path) -> Result<PathBuf> {
        if self.create && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(dir.to_path_buf())
    }
}
