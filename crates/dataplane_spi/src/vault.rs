//! Secret storage for credentials referenced by data addresses

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Resolves secrets by key
pub trait Vault: Send + Sync {
    fn resolve_secret(&self, key: &str) -> Option<String>;
}

/// Process-local vault
#[derive(Debug, Default)]
pub struct InMemoryVault {
    secrets: RwLock<HashMap<String, String>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_secret(&self, key: impl Into<String>, value: impl Into<String>) {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Remove a secret, returning it when present
    pub fn delete_secret(&self, key: &str) -> Option<String> {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

impl Vault for InMemoryVault {
    fn resolve_secret(&self, key: &str) -> Option<String> {
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
