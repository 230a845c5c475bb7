//! Encrypted full-wallet backup
//!
//! The backup payload (format version, address, creation time, the whole
//! vault record) is serialized and sealed under the password as a single
//! blob with its own fresh salt and nonce. Plaintext metadata rides
//! alongside so a backup file can be identified without decrypting it.
//!
//! Restoring opens the outer blob, parses the payload, and then unlocks the
//! embedded record exactly as an import would, including the address
//! integrity check.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use evault_crypto::record::{ALGORITHM, KDF};
use evault_crypto::{codec, SecurityLevel, VaultError, VaultRecord, VaultResult, NONCE_SIZE, SALT_SIZE};

use crate::keysource::{Credential, KeyMaterialSource};
use crate::manager::VaultManager;

/// Backup payload format version.
pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupPayload {
    version: u32,
    address: String,
    created_at: u64,
    record: VaultRecord,
}

/// Plaintext descriptors of a backup file, readable without the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub encryption: String,
    pub kdf: String,
    pub security_level: SecurityLevel,
    pub backup_date: u64,
}

/// An exported backup: one sealed payload plus display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedBackup {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; NONCE_SIZE],
    pub encrypted: Vec<u8>,
    pub metadata: BackupMetadata,
}

impl SealedBackup {
    pub fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| VaultError::MalformedRecord(format!("serialization: {e}")))
    }

    pub fn from_bytes(data: &[u8]) -> VaultResult<Self> {
        serde_json::from_slice(data).map_err(|e| VaultError::MalformedRecord(e.to_string()))
    }
}

/// Seal a full backup of a vault record under a password.
///
/// The outer seal uses the record's security level; the salt and nonce are
/// independent of the record's own.
pub fn create_backup(record: &VaultRecord, password: &SecretString) -> VaultResult<SealedBackup> {
    let payload = BackupPayload {
        version: BACKUP_VERSION,
        address: record.address.clone(),
        created_at: record.created_at,
        record: record.clone(),
    };

    let bytes = serde_json::to_vec(&payload)
        .map_err(|e| VaultError::MalformedRecord(format!("serialization: {e}")))?;

    let level = record.security_level;
    let sealed = codec::seal(&bytes, password, level.iterations())?;

    debug!(address = %payload.address, "backup sealed");

    Ok(SealedBackup {
        salt: sealed.salt,
        iv: sealed.iv,
        encrypted: sealed.ciphertext,
        metadata: BackupMetadata {
            encryption: ALGORITHM.into(),
            kdf: KDF.into(),
            security_level: level,
            backup_date: unix_ms(),
        },
    })
}

/// Open a sealed backup and unlock the embedded record.
pub fn restore_backup<S: KeyMaterialSource>(
    manager: &VaultManager<S>,
    backup: &SealedBackup,
    password: &SecretString,
) -> VaultResult<(Credential, VaultRecord)> {
    let sealed = codec::SealedPayload {
        salt: backup.salt,
        iv: backup.iv,
        ciphertext: backup.encrypted.clone(),
    };

    // The outer iteration count is read from the backup's own metadata.
    let bytes = codec::open(&sealed, password, backup.metadata.security_level.iterations())?;

    let payload: BackupPayload = serde_json::from_slice(&bytes)
        .map_err(|e| VaultError::MalformedRecord(e.to_string()))?;
    payload.record.validate()?;

    let credential = manager.unlock_vault(&payload.record, password)?;

    debug!(address = %payload.address, "backup restored");
    Ok((credential, payload.record))
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keysource::Secp256k1KeySource;

    fn pw(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn manager() -> VaultManager<Secp256k1KeySource> {
        VaultManager::new(Secp256k1KeySource)
    }

    #[test]
    fn test_backup_restore_roundtrip() {
        let m = manager();
        let created = m
            .create_vault(&pw("Str0ng!Pass"), &pw("Str0ng!Pass"), SecurityLevel::Medium)
            .unwrap();

        let backup = create_backup(&created.record, &pw("Str0ng!Pass")).unwrap();
        let (credential, record) = restore_backup(&m, &backup, &pw("Str0ng!Pass")).unwrap();

        assert_eq!(credential.as_bytes(), created.credential.as_bytes());
        assert_eq!(record.address, created.record.address);
    }

    #[test]
    fn test_backup_wrong_password() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let backup = create_backup(&created.record, &pw("password!")).unwrap();
        let result = restore_backup(&m, &backup, &pw("not-the-password"));

        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_backup_tamper_detected() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let mut backup = create_backup(&created.record, &pw("password!")).unwrap();
        let mid = backup.encrypted.len() / 2;
        backup.encrypted[mid] ^= 0x01;

        let result = restore_backup(&m, &backup, &pw("password!"));
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_metadata_readable_without_password() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::High)
            .unwrap();

        let backup = create_backup(&created.record, &pw("password!")).unwrap();
        let bytes = backup.to_bytes().unwrap();
        let reloaded = SealedBackup::from_bytes(&bytes).unwrap();

        assert_eq!(reloaded.metadata.encryption, "AES-256-GCM");
        assert_eq!(reloaded.metadata.kdf, "PBKDF2-SHA256");
        assert_eq!(reloaded.metadata.security_level, SecurityLevel::High);
    }

    #[test]
    fn test_backup_file_missing_field_is_malformed() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let backup = create_backup(&created.record, &pw("password!")).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_slice(&backup.to_bytes().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("salt");
        let bytes = serde_json::to_vec(&value).unwrap();

        let result = SealedBackup::from_bytes(&bytes);
        assert!(matches!(result, Err(VaultError::MalformedRecord(_))));
    }

    #[test]
    fn test_backup_salts_independent_of_record() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let backup = create_backup(&created.record, &pw("password!")).unwrap();
        assert_ne!(backup.salt, created.record.salt);
        assert_ne!(backup.iv, created.record.iv);
    }
}
