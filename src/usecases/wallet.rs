//! Wallet Use Case - Device Key Lifecycle
//!
//! Fetches the device signing key from the `KeyStore`, creating and
//! persisting one on first use. At most one key is ever created per
//! store: concurrent first callers are serialized behind a mutex.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::key::{SigningKey, WalletHandle};
use crate::ports::key_store::KeyStore;

/// Owns the create-once policy for the device key.
pub struct WalletManager<K: KeyStore> {
  store: Arc<K>,
  /// Serializes load-or-create so two callers never both generate.
  create_lock: Mutex<()>,
}

impl<K: KeyStore> WalletManager<K> {
  /// Create a new wallet manager over a key store.
  pub fn new(store: Arc<K>) -> Self {
    Self {
      store,
      create_lock: Mutex::new(()),
    }
  }

  /// Return the persisted key, generating and saving one if absent.
  ///
  /// Persistence errors propagate unchanged; nothing is retried.
  #[instrument(skip(self))]
  pub async fn get_or_create_key(&self) -> Result<SigningKey> {
    let _guard = self.create_lock.lock().await;

    if let Some(key) = self
      .store
      .load_key()
      .await
      .context("Failed to load signing key")?
    {
      debug!("Using persisted signing key");
      return Ok(key);
    }

    let key = SigningKey::generate();
    self
      .store
      .save_key(&key)
      .await
      .context("Failed to persist new signing key")?;

    info!(address = %key.address()?, "Generated new device signing key");
    Ok(key)
  }

  /// Build a fresh wallet handle from the device key.
  pub async fn wallet(&self) -> Result<WalletHandle> {
    let key = self.get_or_create_key().await?;
    WalletHandle::from_key(&key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// In-memory store that counts saves.
  #[derive(Default)]
  struct MemoryStore {
    key: std::sync::Mutex<Option<SigningKey>>,
    saves: AtomicUsize,
  }

  #[async_trait]
  impl KeyStore for MemoryStore {
    async fn load_key(&self) -> Result<Option<SigningKey>> {
      Ok(self.key.lock().unwrap().clone())
    }

    async fn save_key(&self, key: &SigningKey) -> Result<()> {
      tokio::task::yield_now().await;
      self.saves.fetch_add(1, Ordering::SeqCst);
      *self.key.lock().unwrap() = Some(key.clone());
      Ok(())
    }
  }

  #[tokio::test]
  async fn test_second_call_returns_same_key() {
    let store = Arc::new(MemoryStore::default());
    let manager = WalletManager::new(Arc::clone(&store));

    let first = manager.get_or_create_key().await.unwrap();
    let second = manager.get_or_create_key().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_first_use_creates_one_key() {
    let store = Arc::new(MemoryStore::default());
    let manager = Arc::new(WalletManager::new(Arc::clone(&store)));

    let handles: Vec<_> = (0..8)
      .map(|_| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.get_or_create_key().await.unwrap() })
      })
      .collect();

    let mut keys = Vec::new();
    for handle in handles {
      keys.push(handle.await.unwrap());
    }

    assert!(keys.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_existing_key_is_never_replaced() {
    let existing = SigningKey::generate();
    let store = Arc::new(MemoryStore::default());
    *store.key.lock().unwrap() = Some(existing.clone());

    let manager = WalletManager::new(Arc::clone(&store));
    let wallet = manager.wallet().await.unwrap();

    assert_eq!(wallet.address, existing.address().unwrap());
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);
  }
}
