//! PIN gate over the single `pinHash` credential slot.
//!
//! The gate only knows two states, [`PinState::NoPin`] and
//! [`PinState::PinSet`]. Clearing the PIN never touches the `locked` flag of
//! any note: locked notes stay locked but are then unprotected by the
//! verification step, which reports [`NoteError::NoCredential`].
use std::{collections::HashMap, sync::Arc};

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::{NoteError, PinDigest, PinState, Result, StorageAdapter, PIN_HASH_KEY};

pub struct LockGate<S, D> {
    store: Arc<S>,
    digest: D,
}

impl<S: StorageAdapter, D: PinDigest> LockGate<S, D> {
    pub fn new(store: Arc<S>, digest: D) -> Self {
        Self { store, digest }
    }

    async fn stored_hash(&self) -> Result<Option<String>> {
        let records = self.store.get(&[PIN_HASH_KEY]).await.map_err(|e| {
            error!("Failed to read {}: {}", PIN_HASH_KEY, e);
            e
        })?;

        match records.get(PIN_HASH_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(hash)) if hash.is_empty() => Ok(None),
            Some(Value::String(hash)) => Ok(Some(hash.clone())),
            Some(_) => {
                let message = format!("{} record is not a string", PIN_HASH_KEY);
                error!("{}", message);
                Err(NoteError::storage(message))
            }
        }
    }

    pub async fn state(&self) -> Result<PinState> {
        Ok(match self.stored_hash().await? {
            Some(_) => PinState::PinSet,
            None => PinState::NoPin,
        })
    }

    /// Stores the digest of `secret`, replacing any previous PIN.
    ///
    /// Whitespace-only secrets are rejected; the secret is otherwise digested
    /// exactly as given.
    pub async fn set_pin(&self, secret: &str) -> Result<()> {
        if secret.trim().is_empty() {
            return Err(NoteError::validation("PIN must not be empty"));
        }

        let hash = self.digest.digest(secret);
        self.store
            .set(HashMap::from([(PIN_HASH_KEY.to_string(), Value::String(hash))]))
            .await
            .map_err(|e| {
                error!("Failed to store PIN: {}", e);
                e
            })?;

        info!("PIN set");
        Ok(())
    }

    /// Removes the PIN. Notes that are locked stay locked.
    pub async fn clear_pin(&self) -> Result<()> {
        self.store.remove(&[PIN_HASH_KEY]).await.map_err(|e| {
            error!("Failed to remove PIN: {}", e);
            e
        })?;
        info!("PIN cleared");
        Ok(())
    }

    /// Compares `secret` against the stored digest.
    ///
    /// Fails with [`NoteError::NoCredential`] when no PIN is configured so the
    /// caller can tell that apart from a wrong PIN.
    pub async fn verify(&self, secret: &str) -> Result<bool> {
        let Some(stored) = self.stored_hash().await? else {
            debug!("PIN verification requested with no PIN configured");
            return Err(NoteError::NoCredential);
        };

        let matches = self.digest.digest(secret) == stored;
        if !matches {
            warn!("PIN verification failed");
        }
        Ok(matches)
    }

    /// Locking is only allowed while a PIN is set.
    pub async fn can_lock(&self) -> Result<bool> {
        Ok(self.state().await? == PinState::PinSet)
    }
}
