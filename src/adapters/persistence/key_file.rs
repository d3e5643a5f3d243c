//! Key File Store - Atomic JSON Signing-Key Persistence
//!
//! Saves the device signing key to a JSON file using atomic writes
//! (write to tmp file, then rename). The file is either absent or
//! complete, never a partial key. On unix the file is created with
//! owner-only permissions. Encryption at rest is out of scope.

use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::domain::key::SigningKey;
use crate::ports::key_store::KeyStore;

/// On-disk representation of the key file.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    /// 0x-prefixed hex private key.
    private_key: String,
    /// Address derived from the key, for operators inspecting the file.
    address: Address,
    /// When the key was first persisted.
    created_at: DateTime<Utc>,
}

/// File-backed `KeyStore`.
pub struct FileKeyStore {
    /// Path to the key file.
    key_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl FileKeyStore {
    /// Create a key store at `path`.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let key_path = path.as_ref().to_path_buf();
        let mut tmp = key_path.clone().into_os_string();
        tmp.push(".tmp");

        Self {
            key_path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    async fn write_restricted(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.key_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .context("Failed to create key directory")?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.tmp_path)
            .await
            .context("Failed to open tmp key file")?;

        tokio::io::AsyncWriteExt::write_all(&mut file, contents.as_bytes())
            .await
            .context("Failed to write tmp key file")?;
        file.sync_all().await.context("Failed to sync tmp key file")?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.key_path)
            .await
            .context("Failed to rename key file")?;

        Ok(())
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    #[instrument(skip(self), fields(path = %self.key_path.display()))]
    async fn load_key(&self) -> Result<Option<SigningKey>> {
        if !fs::try_exists(&self.key_path)
            .await
            .context("Failed to check key file")?
        {
            info!("No key file found");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.key_path)
            .await
            .context("Failed to read key file")?;

        let file: KeyFile = serde_json::from_str(&json).context("Failed to parse key file JSON")?;
        let key = SigningKey::from_hex(&file.private_key).context("Key file holds an invalid key")?;

        let derived = key.address()?;
        if derived != file.address {
            warn!(
                recorded = %file.address,
                %derived,
                "Key file address does not match its key; using the key"
            );
        }

        Ok(Some(key))
    }

    #[instrument(skip(self, key), fields(path = %self.key_path.display()))]
    async fn save_key(&self, key: &SigningKey) -> Result<()> {
        let file = KeyFile {
            private_key: key.to_hex(),
            address: key.address()?,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize key file")?;

        self.write_restricted(&json).await?;

        info!(address = %file.address, "Signing key persisted");
        Ok(())
    }
}
