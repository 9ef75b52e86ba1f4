//! Application settings.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{fs::maybe_canonicalize, registry::RegistryMode, Error};

/// Settings for a Codex session, usually loaded from a `codex.yaml` at the
/// notebook root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The notebook directory.
    pub notebook_root: PathBuf,
    /// Where installed plugins live.
    pub plugins_dir: PathBuf,
    /// Which component-resolution strategies apply.
    pub mode: RegistryMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notebook_root: PathBuf::from("."),
            plugins_dir: PathBuf::from("plugins"),
            mode: RegistryMode::default(),
        }
    }
}

impl Settings {
    /// Load settings from the given YAML file. A missing file is not an
    /// error: defaults apply.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match maybe_canonicalize(path)? {
            Some(path) => {
                let content = fs::read_to_string(&path)
                    .map_err(|e| Error::Io(format!("while reading {}", path.display()), e))?;
                let settings: Self = serde_yaml::from_str(&content)
                    .wrap_err_with(|| Error::FailedToLoadSettings(path.clone()))?;
                debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            None => {
                debug!(
                    "No such settings file, using defaults: {}",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = Settings::load("does/not/exist.yaml").unwrap();
        assert_eq!(settings.plugins_dir, PathBuf::from("plugins"));
        assert_eq!(settings.mode, RegistryMode::Production);
    }

    #[test]
    fn partial_settings_files_are_filled_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codex.yaml");
        fs::write(&path, "mode: development\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.mode, RegistryMode::Development);
        assert_eq!(settings.notebook_root, PathBuf::from("."));
    }
}
