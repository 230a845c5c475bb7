//! Persisted vault record format
//!
//! JSON layout (field set and numeric ranges round-trip exactly; binary
//! fields persist as integer arrays, not base64):
//!
//! ```json
//! {
//!   "address": "0x…40 hex…",
//!   "algorithm": "AES-256-GCM",
//!   "kdf": "PBKDF2-SHA256",
//!   "iterations": 100000,
//!   "salt": [16 bytes],
//!   "iv": [12 bytes],
//!   "encrypted": [N bytes],
//!   "createdAt": 1754431200000,
//!   "securityLevel": "medium"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::SealedPayload;
use crate::error::{VaultError, VaultResult};
use crate::kdf::{SecurityLevel, ITERATIONS_HIGH, ITERATIONS_MEDIUM};
use crate::{NONCE_SIZE, SALT_SIZE};

/// Cipher identifier stored in every record.
pub const ALGORITHM: &str = "AES-256-GCM";

/// KDF identifier stored in every record.
pub const KDF: &str = "PBKDF2-SHA256";

/// The persisted unit: one sealed credential plus the parameters needed to
/// open it again. Mutated only by a password change, which rewrites salt,
/// nonce, and ciphertext wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub address: String,
    pub algorithm: String,
    pub kdf: String,
    pub iterations: u32,
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; NONCE_SIZE],
    pub encrypted: Vec<u8>,
    pub created_at: u64,
    pub security_level: SecurityLevel,
}

impl VaultRecord {
    /// Assemble a record from a freshly sealed credential.
    pub fn from_sealed(address: String, sealed: SealedPayload, level: SecurityLevel) -> Self {
        Self {
            address,
            algorithm: ALGORITHM.into(),
            kdf: KDF.into(),
            iterations: level.iterations(),
            salt: sealed.salt,
            iv: sealed.iv,
            encrypted: sealed.ciphertext,
            created_at: unix_ms(),
            security_level: level,
        }
    }

    /// View of the sealed triple for [`crate::codec::open`].
    pub fn sealed(&self) -> SealedPayload {
        SealedPayload {
            salt: self.salt,
            iv: self.iv,
            ciphertext: self.encrypted.clone(),
        }
    }

    /// Serialize for export. Output is deterministic for a given record.
    pub fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| VaultError::MalformedRecord(format!("serialization: {e}")))
    }

    /// Parse an exported record, validating shape before any cryptography.
    pub fn from_bytes(data: &[u8]) -> VaultResult<Self> {
        let record: Self = serde_json::from_slice(data)
            .map_err(|e| VaultError::MalformedRecord(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Reject records whose metadata is out of contract. Runs before key
    /// derivation so a garbage record never costs a 200k-iteration KDF pass.
    pub fn validate(&self) -> VaultResult<()> {
        if !is_hex_address(&self.address) {
            return Err(VaultError::MalformedRecord(format!(
                "address {:?} is not 0x-prefixed 40-char hex",
                self.address
            )));
        }
        if self.algorithm != ALGORITHM {
            return Err(VaultError::MalformedRecord(format!(
                "unsupported algorithm {:?}",
                self.algorithm
            )));
        }
        if self.kdf != KDF {
            return Err(VaultError::MalformedRecord(format!(
                "unsupported kdf {:?}",
                self.kdf
            )));
        }
        if self.iterations != ITERATIONS_MEDIUM && self.iterations != ITERATIONS_HIGH {
            return Err(VaultError::MalformedRecord(format!(
                "iteration count {} out of range",
                self.iterations
            )));
        }
        Ok(())
    }
}

fn is_hex_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}
