//! Persistence of the relay configuration as a single JSON document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::models::RelayConfig;
use crate::Result;

/// JSON-file backed configuration store
///
/// Writes go through a temp file in the same directory followed by a rename,
/// so readers only ever observe a complete document.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted configuration overlaid onto the defaults.
    ///
    /// On first run the defaults are written out and returned. A document that
    /// fails to parse is left in place and the defaults are returned.
    pub async fn load(&self) -> Result<RelayConfig> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let defaults = RelayConfig::default();
                self.save(&defaults).await?;
                info!(path = %self.path.display(), "Wrote default relay configuration");
                return Ok(defaults);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<RelayConfig>(&raw) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Persisted relay configuration is unreadable, using defaults"
                );
                Ok(RelayConfig::default())
            }
        }
    }

    /// Replace the persisted configuration.
    pub async fn save(&self, cfg: &RelayConfig) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let body = serde_json::to_vec_pretty(cfg)?;
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "config.json".into(), |n| n.to_string_lossy().into_owned());
        let tmp = dir.join(format!(".{file_name}.{}.tmp", nanoid::nanoid!(8)));

        if let Err(e) = fs::write(&tmp, &body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(())
    }
}
