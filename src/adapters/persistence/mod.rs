//! Persistence Adapters - Local File Storage
//!
//! Implements the `KeyStore` port with an atomically written JSON key
//! file. No database dependency.

pub mod key_file;

pub use key_file::FileKeyStore;
