//! evault-wallet: wallet-facing vault lifecycle
//!
//! Composition over a capability: a [`KeyMaterialSource`] produces fresh
//! credentials, and a [`VaultManager`] wraps one to run the create / unlock /
//! change-password / export / import lifecycle on top of `evault-crypto`.
//! Encrypted full backups and the session-scoped peer messaging key store
//! live alongside.

pub mod backup;
pub mod keysource;
pub mod manager;
pub mod session;

pub use backup::{create_backup, restore_backup, BackupMetadata, SealedBackup};
pub use keysource::{address_for, Credential, KeyMaterial, KeyMaterialSource, Secp256k1KeySource};
pub use manager::{CreatedVault, VaultManager};
pub use session::{MessagingSession, SealedMessage};
