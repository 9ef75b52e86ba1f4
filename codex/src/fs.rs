//! File system-related utilities.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;

use crate::Error;

/// Canonicalize the given path if it exists. If it does not exist, returns
/// `Ok(None)`.
pub fn maybe_canonicalize<P>(path: P) -> Result<Option<PathBuf>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.exists() {
        Ok(Some(path.canonicalize()?))
    } else {
        Ok(None)
    }
}

/// Create the parent directory of the given path, along with any missing
/// intermediate directories.
pub fn ensure_parent_path_exists(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.is_dir() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("while creating {}", parent.display()), e))?;
            debug!("Created path: {}", parent.display());
        }
    }
    Ok(())
}
