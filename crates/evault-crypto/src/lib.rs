//! evault-crypto: password-based sealing for wallet credentials
//!
//! Pipeline: password → PBKDF2-HMAC-SHA256 (100k/200k iterations, 16-byte
//! salt) → 256-bit key → AES-256-GCM (12-byte nonce, no AAD) → vault record
//!
//! The persisted record carries its own KDF parameters (salt, iteration
//! count, security level) so a record sealed under one policy still opens
//! after the default policy changes. Salt and nonce are drawn fresh from the
//! system CSPRNG on every seal; nothing here is ever reused across
//! re-encryptions.

pub mod codec;
pub mod error;
pub mod kdf;
pub mod password;
pub mod record;
pub mod recovery;

pub use codec::{open, seal, SealedPayload};
pub use error::{VaultError, VaultResult};
pub use kdf::{derive_key, DerivedKey, SecurityLevel};
pub use password::{check_new_password, strength_report, Strength, StrengthReport};
pub use record::VaultRecord;
pub use recovery::{generate_recovery_phrase, RecoveryPhrase};

/// Size of a derived vault key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a KDF salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
