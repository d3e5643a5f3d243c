//! Key Store Port - Device Signing Key Persistence
//!
//! Defines the trait for persisting the single signing key owned by
//! this device. The store never rotates or deletes the key; that
//! policy lives in the wallet use case.

use async_trait::async_trait;

use crate::domain::key::SigningKey;

/// Trait for signing-key persistence providers.
///
/// Implementors only move bytes in and out of storage; generation
/// and the create-once policy belong to `WalletManager`.
#[async_trait]
pub trait KeyStore: Send + Sync + 'static {
  /// Load the persisted key, or `None` if none was ever saved.
  async fn load_key(&self) -> anyhow::Result<Option<SigningKey>>;

  /// Persist the key, replacing nothing (called at most once per device).
  async fn save_key(&self, key: &SigningKey) -> anyhow::Result<()>;
}
