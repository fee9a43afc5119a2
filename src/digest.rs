//! PIN digest primitive.
//!
//! The PIN is never persisted in cleartext; only a deterministic one-way
//! digest is stored and compared. This deters casual access, it is not a
//! password-hardening scheme.

use sha2::{Digest, Sha256};

/// Deterministic one-way function from a secret to a comparable token.
pub trait PinDigest: Send + Sync {
    fn digest(&self, secret: &str) -> String;
}

/// SHA-256 hex digest, optionally keyed with an application key.
#[derive(Debug, Clone, Default)]
pub struct Sha256Digest {
    key: Option<Vec<u8>>,
}

impl Sha256Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mixes `key` into every digest so tokens are not portable between
    /// installations configured with different keys.
    pub fn with_key(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: Some(key.as_ref().to_vec()),
        }
    }
}

impl PinDigest for Sha256Digest {
    fn digest(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        if let Some(key) = &self.key {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
        }
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
