//! Key derivation: PBKDF2-HMAC-SHA256 password → vault key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};
use crate::{KEY_SIZE, SALT_SIZE};

/// Iteration counts selected by [`SecurityLevel`]. These are the only two
/// counts a record may carry.
pub const ITERATIONS_MEDIUM: u32 = 100_000;
pub const ITERATIONS_HIGH: u32 = 200_000;

/// KDF work factor chosen at vault creation and stored in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Medium,
    High,
}

impl SecurityLevel {
    pub fn iterations(self) -> u32 {
        match self {
            SecurityLevel::Medium => ITERATIONS_MEDIUM,
            SecurityLevel::High => ITERATIONS_HIGH,
        }
    }
}

impl std::str::FromStr for SecurityLevel {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medium" => Ok(SecurityLevel::Medium),
            "high" => Ok(SecurityLevel::High),
            other => Err(VaultError::InvalidParameters(format!(
                "unknown security level {other:?} (expected \"medium\" or \"high\")"
            ))),
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityLevel::Medium => f.write_str("medium"),
            SecurityLevel::High => f.write_str("high"),
        }
    }
}

/// A 256-bit symmetric key derived from a password.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit vault key from a password and salt.
///
/// Pure and deterministic: identical inputs always yield the identical key.
/// Whether the key is *correct* is only learned downstream, when AEAD
/// authentication and the address check pass or fail.
pub fn derive_key(
    password: &SecretString,
    salt: &[u8],
    iterations: u32,
) -> VaultResult<DerivedKey> {
    if salt.len() != SALT_SIZE {
        return Err(VaultError::InvalidParameters(format!(
            "salt must be {SALT_SIZE} bytes, got {}",
            salt.len()
        )));
    }
    if iterations != ITERATIONS_MEDIUM && iterations != ITERATIONS_HIGH {
        return Err(VaultError::InvalidParameters(format!(
            "iteration count {iterations} is not one of {ITERATIONS_MEDIUM}, {ITERATIONS_HIGH}"
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        iterations,
        &mut key,
    );

    Ok(DerivedKey::from_bytes(key))
}
