//! Config backends holding one blob per guild
//!
//! Directory layout of the JSON file backend:
//! ```text
//! ~/.notifymeon/guilds/
//! ├── guild-<id>.json
//! └── ...
//! ```

use crate::error::{Error, Result};
use crate::events::types::GuildId;
use crate::store::state::GuildBlob;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// External key-value config service, keyed by guild
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Read the guild's blob; `None` when nothing was ever saved
    async fn load(&self, guild: GuildId) -> Result<Option<GuildBlob>>;

    /// Replace the guild's blob
    async fn save(&self, guild: GuildId, blob: &GuildBlob) -> Result<()>;
}

/// Backend writing one pretty-printed JSON file per guild
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create the backend, creating the directory if needed
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, guild: GuildId) -> PathBuf {
        self.dir.join(format!("guild-{}.json", guild))
    }
}

#[async_trait]
impl ConfigBackend for JsonFileBackend {
    async fn load(&self, guild: GuildId) -> Result<Option<GuildBlob>> {
        let path = self.path_for(guild);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let blob = serde_json::from_str(&data)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Some(blob))
    }

    async fn save(&self, guild: GuildId, blob: &GuildBlob) -> Result<()> {
        let path = self.path_for(guild);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(blob)?;

        // Write-then-rename so a crash never leaves a truncated blob
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!("Saved guild {} config to {}", guild, path.display());
        Ok(())
    }
}

/// Backend keeping blobs in memory
#[derive(Default)]
pub struct MemoryBackend {
    blobs: RwLock<HashMap<GuildId, GuildBlob>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn load(&self, guild: GuildId) -> Result<Option<GuildBlob>> {
        Ok(self.blobs.read().await.get(&guild).cloned())
    }

    async fn save(&self, guild: GuildId, blob: &GuildBlob) -> Result<()> {
        self.blobs.write().await.insert(guild, blob.clone());
        Ok(())
    }
}
