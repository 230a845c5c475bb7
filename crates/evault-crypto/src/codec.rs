//! Sealing and opening secret payloads under a password
//!
//! Sealed form: `{salt: 16B, iv: 12B, ciphertext: N+16B}` where the
//! ciphertext carries the GCM tag. Salt and nonce are freshly random per
//! seal; the same (payload, password) sealed twice never yields the same
//! triple. No additional authenticated data is used.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::SecretString;

use crate::error::{VaultError, VaultResult};
use crate::kdf::derive_key;
use crate::{NONCE_SIZE, SALT_SIZE};

/// Output of [`seal`]: everything needed to open the payload again, minus
/// the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypt a secret payload under a password.
///
/// Derives the key with a fresh random salt, encrypts with AES-256-GCM and a
/// fresh random nonce. The iteration count must be one of the supported
/// security-level counts; anything else is rejected as `InvalidParameters`.
pub fn seal(
    payload: &[u8],
    password: &SecretString,
    iterations: u32,
) -> VaultResult<SealedPayload> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut iv = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt, iterations)?;
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), payload)
        .map_err(|_| VaultError::InvalidParameters("payload cannot be encrypted".into()))?;

    Ok(SealedPayload {
        salt,
        iv,
        ciphertext,
    })
}

/// Decrypt a sealed payload with a password.
///
/// Fails with [`VaultError::DecryptionFailed`] on a wrong password, tampered
/// ciphertext, or mismatched parameters; the three causes are
/// indistinguishable by construction. Callers must not retry automatically:
/// a failure here needs new user input, not a loop.
pub fn open(
    sealed: &SealedPayload,
    password: &SecretString,
    iterations: u32,
) -> VaultResult<Vec<u8>> {
    // A bad iteration count or salt length at open time is attacker-facing
    // input and folds into the same failure as a wrong password.
    let key = derive_key(password, &sealed.salt, iterations)
        .map_err(|_| VaultError::DecryptionFailed)?;
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(&sealed.iv), sealed.ciphertext.as_ref())
        .map_err(|_| VaultError::DecryptionFailed)
}
