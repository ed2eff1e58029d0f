// src/storage.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::issue::LocalInventory;

const PARTIAL_EXT: &str = "part";

#[async_trait]
pub trait Storage: Send + Sync {
    /// Snapshot of the filenames currently stored.
    async fn list(&self) -> Result<LocalInventory>;
    async fn exists(&self, filename: &str) -> Result<bool> {
        Ok(self.list().await?.contains(filename))
    }
    /// Persist `bytes` under `filename`; returns where it landed.
    async fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// A plain directory. Writes go to `<name>.part` and are renamed into place, so
/// an interrupted write never shows up under the final name; a stale `.part`
/// is ignored by `list` and overwritten by the next attempt.
pub struct LocalDirStorage {
    dir: PathBuf,
}

impl LocalDirStorage {
    /// Create the directory if needed and check it is writable.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating output dir {}", dir.display()))?;
        let probe = dir.join(".write-probe");
        tokio::fs::write(&probe, b"")
            .await
            .with_context(|| format!("output dir {} is not writable", dir.display()))?;
        let _ = tokio::fs::remove_file(&probe).await;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename.contains(['/', '\\'])
        || filename == "."
        || filename == ".."
    {
        bail!("refusing to write unsafe filename {filename:?}");
    }
    Ok(())
}

#[async_trait]
impl Storage for LocalDirStorage {
    async fn list(&self) -> Result<LocalInventory> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("listing {}", self.dir.display()))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let partial = Path::new(&name).extension().and_then(|e| e.to_str()) == Some(PARTIAL_EXT);
            if partial || name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        Ok(names.into_iter().collect())
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        // A name that could never be written cannot be present either.
        if check_filename(filename).is_err() {
            return Ok(false);
        }
        let path = self.dir.join(filename);
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("checking {}", path.display()))
    }

    async fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        check_filename(filename)?;
        let target = self.dir.join(filename);
        let tmp = self.dir.join(format!("{filename}.{PARTIAL_EXT}"));

        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("writing {}", tmp.display()));
        }
        tokio::fs::rename(&tmp, &target)
            .await
            .with_context(|| format!("moving {} into place", target.display()))?;
        Ok(target)
    }
}
