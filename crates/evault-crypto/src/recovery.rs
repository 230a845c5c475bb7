//! Recovery phrase generation
//!
//! A 12-word BIP-39 phrase from fresh entropy, generated once at vault
//! creation, shown to the user, and never persisted. The phrase is an
//! operator-facing artifact: it is independent of the sealed credential and
//! cannot reconstruct it.

use bip39::Mnemonic;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{VaultError, VaultResult};

/// Word count of a generated phrase (128 bits of entropy).
pub const PHRASE_WORDS: usize = 12;

/// A phrase for the user to write down, with a checksum of the entropy it
/// was drawn from so two transcriptions can be compared without retyping
/// every word.
#[derive(Clone)]
pub struct RecoveryPhrase {
    pub words: String,
    pub checksum: [u8; 32],
}

impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryPhrase")
            .field("words", &"[REDACTED]")
            .field("checksum", &hex_prefix(&self.checksum))
            .finish()
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes[..4].iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a fresh 12-word phrase.
pub fn generate_recovery_phrase() -> VaultResult<RecoveryPhrase> {
    let mut entropy = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| VaultError::InvalidParameters(format!("mnemonic generation: {e}")))?;

    Ok(RecoveryPhrase {
        words: mnemonic.to_string(),
        checksum: Sha256::digest(entropy).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_has_twelve_words() {
        let phrase = generate_recovery_phrase().unwrap();
        assert_eq!(phrase.words.split_whitespace().count(), PHRASE_WORDS);
    }

    #[test]
    fn test_phrase_is_valid_bip39() {
        let phrase = generate_recovery_phrase().unwrap();
        assert!(phrase.words.parse::<Mnemonic>().is_ok());
    }

    #[test]
    fn test_phrases_are_unique() {
        let p1 = generate_recovery_phrase().unwrap();
        let p2 = generate_recovery_phrase().unwrap();

        assert_ne!(p1.words, p2.words, "fresh entropy must yield fresh phrases");
        assert_ne!(p1.checksum, p2.checksum);
    }

    #[test]
    fn test_debug_redacts_words() {
        let phrase = generate_recovery_phrase().unwrap();
        let rendered = format!("{phrase:?}");
        assert!(rendered.contains("[REDACTED]"));
        let first_word = phrase.words.split_whitespace().next().unwrap();
        assert!(!rendered.contains(&format!("{first_word} ")));
    }
}
