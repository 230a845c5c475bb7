use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Failures surfaced by vault operations.
///
/// `DecryptionFailed` deliberately covers wrong password, tampered
/// ciphertext, and mismatched parameters without saying which: refining it
/// would hand an oracle to whoever supplied the record.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("decryption failed: invalid password or corrupted data")]
    DecryptionFailed,

    #[error("decrypted key does not match the recorded address")]
    AddressMismatch,

    #[error("malformed vault record: {0}")]
    MalformedRecord(String),
}
