//! Local signing key and the wallet handle derived from it.

use std::fmt;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};

/// A secp256k1 private key owned by this device.
///
/// Created once on first use and never rotated. `Debug` never prints
/// the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(B256);

impl SigningKey {
    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        Self(PrivateKeySigner::random().to_bytes())
    }

    /// Wrap raw bytes, rejecting values that are not valid scalars.
    pub fn from_bytes(bytes: B256) -> Result<Self> {
        PrivateKeySigner::from_bytes(&bytes).context("Invalid secp256k1 private key")?;
        Ok(Self(bytes))
    }

    /// Parse a 0x-prefixed (or bare) hex private key.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes: B256 = hex
            .trim()
            .parse()
            .context("Private key is not 32 bytes of hex")?;
        Self::from_bytes(bytes)
    }

    /// 0x-prefixed hex encoding, for persistence only.
    pub fn to_hex(&self) -> String {
        alloy::hex::encode_prefixed(self.0)
    }

    /// Signer for this key.
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        PrivateKeySigner::from_bytes(&self.0).context("Invalid secp256k1 private key")
    }

    /// Account address controlled by this key.
    pub fn address(&self) -> Result<Address> {
        Ok(self.signer()?.address())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// A signer derived from the device key.
///
/// Cheap to rebuild; holds nothing besides the key material.
#[derive(Debug, Clone)]
pub struct WalletHandle {
    /// Account address.
    pub address: Address,
    /// Signer able to sign transactions and messages.
    pub signer: PrivateKeySigner,
}

impl WalletHandle {
    pub fn from_key(key: &SigningKey) -> Result<Self> {
        let signer = key.signer()?;
        Ok(Self {
            address: signer.address(),
            signer,
        })
    }
}
