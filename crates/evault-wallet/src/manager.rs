//! Vault lifecycle: create, unlock, change password, export, import
//!
//! State machine per vault: Uninitialized → Sealed (create), Sealed →
//! Sealed' (change password, fresh salt/nonce/ciphertext), Sealed →
//! Destroyed (caller wipes the record). "Unlocked" is not a persisted
//! state; it is the decrypted credential held by the caller, and only for
//! as long as the caller holds it.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use evault_crypto::password::MIN_PASSWORD_LENGTH;
use evault_crypto::{
    check_new_password, codec, generate_recovery_phrase, RecoveryPhrase, SecurityLevel,
    VaultError, VaultRecord, VaultResult,
};

use crate::keysource::{address_for, Credential, KeyMaterialSource};

/// Orchestrates vault operations over a key-material source.
///
/// Holds no vault state itself: records live wherever the caller persists
/// them, and an unlocked credential exists only as a return value. Two
/// writers re-sealing the same persisted record race to a lost update;
/// serializing them is the caller's job.
pub struct VaultManager<S> {
    source: S,
}

/// Everything handed back by vault creation.
///
/// The credential is returned transiently so the caller can connect a
/// session immediately; keeping it out of unencrypted storage is the
/// caller's responsibility. The recovery phrase is shown once and never
/// persisted here.
pub struct CreatedVault {
    pub record: VaultRecord,
    pub recovery: RecoveryPhrase,
    pub credential: Credential,
}

impl<S: KeyMaterialSource> VaultManager<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Create a new sealed vault from fresh key material.
    pub fn create_vault(
        &self,
        password: &SecretString,
        confirm: &SecretString,
        level: SecurityLevel,
    ) -> VaultResult<CreatedVault> {
        check_new_password(password, confirm)?;

        let material = self.source.generate()?;
        let sealed = codec::seal(material.credential.as_bytes(), password, level.iterations())?;
        let recovery = generate_recovery_phrase()?;
        let record = VaultRecord::from_sealed(material.address, sealed, level);

        debug!(address = %abbrev(&record.address), %level, "vault created");

        Ok(CreatedVault {
            record,
            recovery,
            credential: material.credential,
        })
    }

    /// Decrypt a record back into its credential.
    pub fn unlock_vault(
        &self,
        record: &VaultRecord,
        password: &SecretString,
    ) -> VaultResult<Credential> {
        // The iteration count comes from the record, not the session default:
        // records sealed under an older policy must keep opening.
        let payload = codec::open(&record.sealed(), password, record.iterations)?;

        // Authenticated plaintext that is not a credential means the record
        // was sealed over garbage; indistinguishable from corruption.
        let credential =
            Credential::from_payload(payload).map_err(|_| VaultError::DecryptionFailed)?;

        let derived = address_for(&credential).map_err(|_| VaultError::DecryptionFailed)?;
        if !derived.eq_ignore_ascii_case(&record.address) {
            return Err(VaultError::AddressMismatch);
        }

        debug!(address = %abbrev(&record.address), "vault unlocked");
        Ok(credential)
    }

    /// Re-seal a record under a new password.
    ///
    /// Salt and nonce are fresh even when the new password equals the old
    /// one in value. The returned record is fully constructed before the
    /// caller discards the old one, so no partial overwrite is ever visible.
    pub fn change_password(
        &self,
        record: &VaultRecord,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> VaultResult<VaultRecord> {
        let credential = self.unlock_vault(record, old_password)?;

        if new_password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(VaultError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        let sealed = codec::seal(
            credential.as_bytes(),
            new_password,
            record.security_level.iterations(),
        )?;

        let mut new_record =
            VaultRecord::from_sealed(record.address.clone(), sealed, record.security_level);
        new_record.created_at = record.created_at;

        debug!(address = %abbrev(&record.address), "vault password changed");
        Ok(new_record)
    }

    /// Serialize a record for export. The ciphertext stays opaque without
    /// the password; no other secret material leaves.
    pub fn export_vault(&self, record: &VaultRecord) -> VaultResult<Vec<u8>> {
        record.to_bytes()
    }

    /// Parse and unlock an exported record.
    ///
    /// Shape validation happens first: a record missing fields or carrying
    /// out-of-contract values fails with `MalformedRecord` before any key
    /// derivation is attempted.
    pub fn import_vault(
        &self,
        data: &[u8],
        password: &SecretString,
    ) -> VaultResult<(Credential, VaultRecord)> {
        let record = VaultRecord::from_bytes(data)?;
        let credential = self.unlock_vault(&record, password)?;

        debug!(address = %abbrev(&record.address), "vault imported");
        Ok((credential, record))
    }
}

fn abbrev(address: &str) -> &str {
    address.get(..10).unwrap_or(address)
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
    fn test_create_and_unlock_roundtrip() {
        let m = manager();
        let created = m
            .create_vault(&pw("Str0ng!Pass"), &pw("Str0ng!Pass"), SecurityLevel::High)
            .unwrap();

        let unlocked = m.unlock_vault(&created.record, &pw("Str0ng!Pass")).unwrap();
        assert_eq!(unlocked.as_bytes(), created.credential.as_bytes());
    }

    #[test]
    fn test_create_records_level_parameters() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        assert_eq!(created.record.iterations, 100_000);
        assert_eq!(created.record.security_level, SecurityLevel::Medium);
        assert_eq!(created.record.address.len(), 42);
    }

    #[test]
    fn test_create_rejects_mismatched_confirmation() {
        let result = manager().create_vault(&pw("password-a"), &pw("password-b"), SecurityLevel::High);
        assert!(matches!(result, Err(VaultError::PasswordMismatch)));
    }

    #[test]
    fn test_create_rejects_short_password() {
        let result = manager().create_vault(&pw("short"), &pw("short"), SecurityLevel::High);
        assert!(matches!(result, Err(VaultError::WeakPassword { .. })));
    }

    #[test]
    fn test_unlock_wrong_password() {
        let m = manager();
        let created = m
            .create_vault(&pw("Str0ng!Pass"), &pw("Str0ng!Pass"), SecurityLevel::High)
            .unwrap();

        let result = m.unlock_vault(&created.record, &pw("wrong"));
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_unlock_detects_address_tamper() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        // Valid-looking address that does not belong to the credential
        let mut record = created.record;
        record.address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".into();

        let result = m.unlock_vault(&record, &pw("password!"));
        assert!(matches!(result, Err(VaultError::AddressMismatch)));
    }

    #[test]
    fn test_unlock_accepts_checksummed_address_case() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let mut record = created.record;
        record.address = record.address.to_uppercase().replace("0X", "0x");

        assert!(m.unlock_vault(&record, &pw("password!")).is_ok());
    }

    #[test]
    fn test_change_password_semantics() {
        let m = manager();
        let created = m
            .create_vault(&pw("old-password"), &pw("old-password"), SecurityLevel::Medium)
            .unwrap();

        let new_record = m
            .change_password(&created.record, &pw("old-password"), &pw("new-password"))
            .unwrap();

        // Fresh salt/nonce/ciphertext, same identity
        assert_ne!(new_record.salt, created.record.salt);
        assert_ne!(new_record.iv, created.record.iv);
        assert_ne!(new_record.encrypted, created.record.encrypted);
        assert_eq!(new_record.address, created.record.address);
        assert_eq!(new_record.created_at, created.record.created_at);

        let unlocked = m.unlock_vault(&new_record, &pw("new-password")).unwrap();
        assert_eq!(unlocked.as_bytes(), created.credential.as_bytes());

        let old_attempt = m.unlock_vault(&new_record, &pw("old-password"));
        assert!(matches!(old_attempt, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_change_password_same_value_still_reseals() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let new_record = m
            .change_password(&created.record, &pw("password!"), &pw("password!"))
            .unwrap();

        assert_ne!(new_record.salt, created.record.salt);
        assert_ne!(new_record.iv, created.record.iv);
    }

    #[test]
    fn test_change_password_rejects_weak_replacement() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::Medium)
            .unwrap();

        let result = m.change_password(&created.record, &pw("password!"), &pw("tiny"));
        assert!(matches!(result, Err(VaultError::WeakPassword { .. })));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let m = manager();
        let created = m
            .create_vault(&pw("password!"), &pw("password!"), SecurityLevel::High)
            .unwrap();

        let exported = m.export_vault(&created.record).unwrap();
        let (credential, record) = m.import_vault(&exported, &pw("password!")).unwrap();

        assert_eq!(credential.as_bytes(), created.credential.as_bytes());
        assert_eq!(record.address, created.record.address);
    }

    #[test]
    fn test_import_garbage_is_malformed() {
        let result = manager().import_vault(b"not json at all", &pw("password!"));
        assert!(matches!(result, Err(VaultError::MalformedRecord(_))));
    }
}
