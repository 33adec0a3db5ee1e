//! An owned registry for unique generated identifiers.
//!
//! Instead of a process-wide set of issued IDs, uniqueness is a property of
//! the registry instance that owns the tokens. Whoever needs unique
//! identifiers owns (or is handed) an `IdRegistry`.

use crate::common::TokenId;
use slotmap::{Key, SlotMap};

/// Issues unique tokens with stable rendered labels.
///
/// A token stays valid until it is released; its label never changes while
/// it is held, and released token keys are never handed out again.
pub struct IdRegistry {
    prefix: String,
    issued: SlotMap<TokenId, String>,
}

impl IdRegistry {
    /// Creates a registry whose labels start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: SlotMap::with_key(),
        }
    }

    /// Issues a fresh token and records its rendered label.
    pub fn issue(&mut self) -> TokenId {
        let prefix = self.prefix.clone();
        self.issued
            .insert_with_key(|key| format!("{}-{:x}", prefix, key.data().as_ffi()))
    }

    /// The rendered label of a held token, if it is still held.
    pub fn label(&self, id: TokenId) -> Option<&str> {
        self.issued.get(id).map(String::as_str)
    }

    /// Releases a token. Returns `true` if it was held.
    pub fn release(&mut self, id: TokenId) -> bool {
        self.issued.remove(id).is_some()
    }

    /// True if the token is currently held.
    pub fn contains(&self, id: TokenId) -> bool {
        self.issued.contains_key(id)
    }

    /// Number of currently held tokens.
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// True if no tokens are held.
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
