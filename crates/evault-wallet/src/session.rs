//! Session-scoped peer messaging keys
//!
//! One X25519 keypair per session plus an explicit keyed store of derived
//! peer keys with establish / lookup / evict operations. The store is owned
//! by the session value (there is no process-wide registry) and every
//! entry is zeroized when evicted or when the session is dropped.
//!
//! Message keys: X25519 shared secret → HKDF-SHA256 with a domain string →
//! 256-bit AES-GCM key. Each sealed message carries the sender's public key
//! and a fresh 12-byte nonce.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use evault_crypto::{VaultError, VaultResult, KEY_SIZE, NONCE_SIZE};

const SESSION_KEY_DOMAIN: &[u8] = b"evault-session-v1";

/// A derived per-peer message key. Opaque; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// An encrypted peer message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedMessage {
    /// Sender's X25519 public key, so the receiver can derive the same key.
    pub sender: [u8; 32],
    pub iv: [u8; NONCE_SIZE],
    pub encrypted: Vec<u8>,
}

/// A messaging session: our keypair and the per-peer key store.
pub struct MessagingSession {
    secret: StaticSecret,
    public: PublicKey,
    peers: HashMap<[u8; 32], SessionKey>,
}

impl MessagingSession {
    pub fn new() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret = StaticSecret::from(bytes);
        bytes.zeroize();
        let public = PublicKey::from(&secret);

        Self {
            secret,
            public,
            peers: HashMap::new(),
        }
    }

    /// Our public key, to hand to peers.
    pub fn public_key(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Derive (or return the cached) message key for a peer.
    pub fn establish(&mut self, peer: &[u8; 32]) -> VaultResult<&SessionKey> {
        match self.peers.entry(*peer) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let shared = self.secret.diffie_hellman(&PublicKey::from(*peer));
                let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
                let mut okm = [0u8; KEY_SIZE];
                hk.expand(SESSION_KEY_DOMAIN, &mut okm)
                    .map_err(|e| VaultError::InvalidParameters(format!("HKDF expand: {e}")))?;
                Ok(entry.insert(SessionKey { bytes: okm }))
            }
        }
    }

    /// Look up an already-established peer key.
    pub fn lookup(&self, peer: &[u8; 32]) -> Option<&SessionKey> {
        self.peers.get(peer)
    }

    /// Drop a peer's key from the store. Returns whether one was present.
    pub fn evict(&mut self, peer: &[u8; 32]) -> bool {
        self.peers.remove(peer).is_some()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Encrypt a message to a peer, establishing the key if needed.
    pub fn encrypt_message(
        &mut self,
        peer: &[u8; 32],
        plaintext: &[u8],
    ) -> VaultResult<SealedMessage> {
        let sender = self.public_key();
        let key = self.establish(peer)?;
        let cipher = Aes256Gcm::new((&key.bytes).into());

        let mut iv = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let encrypted = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| VaultError::InvalidParameters("message cannot be encrypted".into()))?;

        Ok(SealedMessage {
            sender,
            iv,
            encrypted,
        })
    }

    /// Decrypt a message using the key derived from its sender field.
    pub fn decrypt_message(&mut self, message: &SealedMessage) -> VaultResult<Vec<u8>> {
        let key = self.establish(&message.sender)?;
        let cipher = Aes256Gcm::new((&key.bytes).into());

        cipher
            .decrypt(Nonce::from_slice(&message.iv), message.encrypted.as_ref())
            .map_err(|_| VaultError::DecryptionFailed)
    }
}

impl Default for MessagingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_have_distinct_keys() {
        let a = MessagingSession::new();
        let b = MessagingSession::new();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_message_roundtrip_both_directions() {
        let mut alice = MessagingSession::new();
        let mut bob = MessagingSession::new();

        let to_bob = alice.encrypt_message(&bob.public_key(), b"hello bob").unwrap();
        assert_eq!(bob.decrypt_message(&to_bob).unwrap(), b"hello bob");

        let to_alice = bob.encrypt_message(&alice.public_key(), b"hi alice").unwrap();
        assert_eq!(alice.decrypt_message(&to_alice).unwrap(), b"hi alice");
    }

    #[test]
    fn test_tampered_message_fails() {
        let mut alice = MessagingSession::new();
        let mut bob = MessagingSession::new();

        let mut message = alice.encrypt_message(&bob.public_key(), b"payload").unwrap();
        message.encrypted[0] ^= 0x01;

        let result = bob.decrypt_message(&message);
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_third_party_cannot_decrypt() {
        let mut alice = MessagingSession::new();
        let bob = MessagingSession::new();
        let mut eve = MessagingSession::new();

        let message = alice.encrypt_message(&bob.public_key(), b"for bob only").unwrap();
        let result = eve.decrypt_message(&message);

        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_establish_caches_and_evict_clears() {
        let mut alice = MessagingSession::new();
        let bob = MessagingSession::new();
        let peer = bob.public_key();

        assert!(alice.lookup(&peer).is_none());
        alice.establish(&peer).unwrap();
        assert!(alice.lookup(&peer).is_some());
        assert_eq!(alice.peer_count(), 1);

        assert!(alice.evict(&peer));
        assert!(alice.lookup(&peer).is_none());
        assert!(!alice.evict(&peer));
    }

    #[test]
    fn test_messages_use_fresh_nonces() {
        let mut alice = MessagingSession::new();
        let bob = MessagingSession::new();
        let peer = bob.public_key();

        let m1 = alice.encrypt_message(&peer, b"same text").unwrap();
        let m2 = alice.encrypt_message(&peer, b"same text").unwrap();

        assert_ne!(m1.iv, m2.iv);
        assert_ne!(m1.encrypted, m2.encrypted);
    }

    #[test]
    fn test_evicted_peer_rederives_same_key() {
        let mut alice = MessagingSession::new();
        let mut bob = MessagingSession::new();
        let peer = bob.public_key();

        let message = alice.encrypt_message(&peer, b"before evict").unwrap();
        alice.evict(&peer);

        // Receiving still works: the key re-derives from the same keypairs
        assert_eq!(bob.decrypt_message(&message).unwrap(), b"before evict");
    }
}
