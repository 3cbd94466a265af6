//! Owned collection service with write-through persistence

use super::storage::KeyValueStore;
use crate::error::{StorageError, StorageResult};
use crate::models::Card;
use crate::price::market_price;
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized collection
pub const STORAGE_KEY: &str = "collector-storage";

/// Current layout version of the persisted envelope
const STORAGE_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCollection {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    collection: Vec<Card>,
}

/// Borrowed view used when writing, so saves don't clone every card
#[derive(Serialize)]
struct PersistedCollectionRef<'a> {
    state: PersistedStateRef<'a>,
    version: u32,
}

#[derive(Serialize)]
struct PersistedStateRef<'a> {
    collection: &'a [Card],
}

/// The user's owned cards, insertion-ordered and unique by card id.
///
/// Created once at startup with [`CollectionStore::open`] and passed by
/// reference to whatever needs it. Every mutation is saved to the backend
/// before the in-memory state changes; a failed save leaves both untouched.
pub struct CollectionStore<S: KeyValueStore> {
    backend: S,
    key: String,
    cards: Vec<Card>,
}

impl<S: KeyValueStore> CollectionStore<S> {
    /// Load the collection from `backend` (empty if nothing was saved yet)
    pub fn open(backend: S) -> StorageResult<Self> {
        Self::open_with_key(backend, STORAGE_KEY)
    }

    pub fn open_with_key(backend: S, key: &str) -> StorageResult<Self> {
        let cards = match backend.load(key)? {
            Some(content) => {
                let persisted: PersistedCollection =
                    serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                if persisted.version != STORAGE_VERSION {
                    log::warn!(
                        "Collection stored with version {}, expected {}",
                        persisted.version,
                        STORAGE_VERSION
                    );
                }
                log::info!(
                    "Loaded collection with {} cards",
                    persisted.state.collection.len()
                );
                persisted.state.collection
            }
            None => {
                log::info!("Starting with empty collection");
                Vec::new()
            }
        };

        Ok(Self {
            backend,
            key: key.to_string(),
            cards,
        })
    }

    /// Add a card. Returns `false` (and writes nothing) if its id is already owned.
    pub fn add(&mut self, card: Card) -> StorageResult<bool> {
        if self.contains(&card.id) {
            log::debug!("Card {} already in collection", card.id);
            return Ok(false);
        }

        let mut next = self.cards.clone();
        log::info!("Adding {} ({}) to collection", card.name, card.id);
        next.push(card);
        self.commit(next)?;
        Ok(true)
    }

    /// Remove a card by id. Returns `false` if it was not owned.
    pub fn remove(&mut self, id: &str) -> StorageResult<bool> {
        if !self.contains(id) {
            log::debug!("Card {} not in collection, nothing to remove", id);
            return Ok(false);
        }

        let next: Vec<Card> = self.cards.iter().filter(|c| c.id != id).cloned().collect();
        log::info!("Removing {} from collection", id);
        self.commit(next)?;
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Sum of resolved market prices; cards with unknown prices count as zero
    pub fn total_value(&self) -> f64 {
        self.cards
            .iter()
            .map(|card| market_price(card).unwrap_or(0.0))
            .sum()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Rewrite the current state to the backend
    pub fn flush(&mut self) -> StorageResult<()> {
        let content = Self::serialize(&self.cards)?;
        self.backend.save(&self.key, &content)
    }

    /// Flush and hand back the backend (shutdown)
    pub fn close(mut self) -> StorageResult<S> {
        self.flush()?;
        log::info!("Collection saved with {} cards", self.cards.len());
        Ok(self.backend)
    }

    /// Persist `next`, then make it the in-memory state
    fn commit(&mut self, next: Vec<Card>) -> StorageResult<()> {
        let content = Self::serialize(&next)?;
        self.backend.save(&self.key, &content)?;
        self.cards = next;
        Ok(())
    }

    fn serialize(cards: &[Card]) -> StorageResult<String> {
        let persisted = PersistedCollectionRef {
            state: PersistedStateRef { collection: cards },
            version: STORAGE_VERSION,
        };
        Ok(serde_json::to_string(&persisted)?)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
