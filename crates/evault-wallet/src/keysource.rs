//! Wallet key material: secp256k1 credentials and EVM addresses
//!
//! Address derivation follows the EVM convention:
//! `keccak256(uncompressed_pubkey[1..])[12..]`, rendered as lowercase hex
//! with a `0x` prefix.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use evault_crypto::{VaultError, VaultResult};

/// Size of a wallet credential (secp256k1 scalar) in bytes.
pub const CREDENTIAL_SIZE: usize = 32;

/// A wallet private key. Zeroized on drop; never persisted unencrypted.
#[derive(Clone)]
pub struct Credential {
    bytes: [u8; CREDENTIAL_SIZE],
}

impl Credential {
    pub fn from_bytes(bytes: [u8; CREDENTIAL_SIZE]) -> Self {
        Self { bytes }
    }

    /// Reconstruct a credential from a decrypted payload, consuming and
    /// zeroizing the buffer.
    pub fn from_payload(mut payload: Vec<u8>) -> VaultResult<Self> {
        if payload.len() != CREDENTIAL_SIZE {
            payload.zeroize();
            return Err(VaultError::InvalidParameters(format!(
                "credential must be {CREDENTIAL_SIZE} bytes, got {}",
                payload.len()
            )));
        }
        let mut bytes = [0u8; CREDENTIAL_SIZE];
        bytes.copy_from_slice(&payload);
        payload.zeroize();
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; CREDENTIAL_SIZE] {
        &self.bytes
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Freshly generated key material: a credential plus its public address.
#[derive(Debug)]
pub struct KeyMaterial {
    pub credential: Credential,
    pub address: String,
}

/// Capability producing fresh wallet key material.
///
/// A [`crate::VaultManager`] wraps a source; the source itself knows nothing
/// about passwords or persistence.
pub trait KeyMaterialSource {
    fn generate(&self) -> VaultResult<KeyMaterial>;
}

/// Random secp256k1 key material with EVM-style addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1KeySource;

impl KeyMaterialSource for Secp256k1KeySource {
    fn generate(&self) -> VaultResult<KeyMaterial> {
        let secret = SecretKey::random(&mut rand::thread_rng());
        let credential = Credential::from_bytes(secret.to_bytes().into());
        let address = address_for(&credential)?;
        Ok(KeyMaterial {
            credential,
            address,
        })
    }
}

/// Recompute the public address for a credential.
///
/// Used at unlock time as an integrity check independent of AEAD
/// authentication: a record whose address field was corrupted on its own
/// still fails to unlock.
pub fn address_for(credential: &Credential) -> VaultResult<String> {
    let secret = SecretKey::from_slice(credential.as_bytes()).map_err(|_| {
        VaultError::InvalidParameters("credential is not a valid secp256k1 scalar".into())
    })?;

    let public = secret.public_key();
    let encoded = public.to_encoded_point(false);
    // Skip the 0x04 SEC1 prefix byte
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);

    Ok(format!("0x{}", hex::encode(&hash[12..])))
}
