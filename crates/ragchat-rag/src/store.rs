//! The single persisted index and its replacement

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use ragchat_core::{Error, Result};

use crate::index::VectorIndex;

/// Owns the index directory. At most one index lives there at a time.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        VectorIndex::exists(&self.dir)
    }

    pub fn load(&self) -> Result<VectorIndex> {
        VectorIndex::load(&self.dir)
    }

    /// Swap `index` in for whatever is stored now.
    ///
    /// The new index is written to a sibling staging directory and renamed
    /// into place, so a failure at any step leaves the previous index intact.
    /// Returns whether a previous index was discarded.
    pub fn replace(&self, index: &VectorIndex) -> Result<bool> {
        let parent = self
            .dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = self
            .dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::Configuration(format!("invalid index directory {}", self.dir.display()))
            })?;
        fs::create_dir_all(parent)?;

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.staging", name))
            .tempdir_in(parent)?;
        index.save(staging.path())?;

        let replaced_previous = self.exists();
        let backup = parent.join(format!(".{}.old-{}", name, Uuid::new_v4().simple()));

        let staged = staging.keep();
        swap_dirs(&staged, &self.dir, &backup, |from, to| fs::rename(from, to))?;

        info!(
            dir = %self.dir.display(),
            chunks = index.len(),
            replaced_previous,
            "index stored"
        );
        Ok(replaced_previous)
    }

    /// Remove the stored index. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.dir)?;
        Ok(true)
    }
}

/// Move `live` aside to `backup`, then `staged` into `live`.
///
/// When the second rename fails the backup is moved back and `staged` is
/// deleted.
fn swap_dirs<F>(staged: &Path, live: &Path, backup: &Path, rename: F) -> std::io::Result<()>
where
    F: Fn(&Path, &Path) -> std::io::Result<()>,
{
    let had_dir = live.exists();
    if had_dir {
        rename(live, backup)?;
    }

    if let Err(e) = rename(staged, live) {
        error!(dir = %live.display(), error = %e, "failed to move new index into place");
        if had_dir {
            if let Err(restore) = rename(backup, live) {
                error!(backup = %backup.display(), error = %restore, "failed to restore previous index");
            }
        }
        let _ = fs::remove_dir_all(staged);
        return Err(e);
    }

    if had_dir {
        if let Err(e) = fs::remove_dir_all(backup) {
            warn!(backup = %backup.display(), error = %e, "could not remove old index");
        }
    }
    Ok(())
}
