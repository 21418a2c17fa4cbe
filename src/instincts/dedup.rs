//! Duplicate suppression in front of the knowledge store

use crate::storage::KnowledgeStore;
use crate::types::Instinct;
use tracing::warn;

/// Decides whether a candidate instinct is already known.
///
/// Permissive by default: with no store, or when the lookup fails, the
/// candidate is treated as new.
pub struct DedupGateway<'a> {
    store: Option<&'a dyn KnowledgeStore>,
}

impl<'a> DedupGateway<'a> {
    pub fn new(store: Option<&'a dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    pub fn is_duplicate(&self, instinct: &Instinct) -> bool {
        let Some(store) = self.store else {
            return false;
        };

        match store.has_similar(instinct) {
            Ok(found) => found,
            Err(e) => {
                warn!("Duplicate check failed, treating as new: {}", e);
                false
            }
        }
    }
}
