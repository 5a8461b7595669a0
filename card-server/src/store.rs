//! In-memory card store with optional JSON seeding.
//!
//! Holds every card the service knows about together with its scan count.
//! Only published cards are visible through the public lookups.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use card_core::{Analytics, CardProvider, CardView, ViewerError, ViewerResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or querying the card store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Seed file could not be read.
    #[error("failed to read card seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not a JSON array of cards.
    #[error("invalid card seed file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two seeded cards share a public id.
    #[error("duplicate card id: {0}")]
    DuplicateId(String),

    /// No published card with this id.
    #[error("card not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for ViewerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ViewerError::NotFound(id),
            other => ViewerError::Provider(other.to_string()),
        }
    }
}

/// A card record as stored, with its analytics counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCard {
    /// Card content.
    #[serde(flatten)]
    pub card: CardView,
    /// Number of recorded views.
    #[serde(default)]
    pub scan_count: u64,
}

impl From<CardView> for StoredCard {
    fn from(card: CardView) -> Self {
        Self {
            card,
            scan_count: 0,
        }
    }
}

/// Thread-safe card store keyed by public card id.
#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Arc<RwLock<HashMap<String, StoredCard>>>,
}

impl CardStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load cards from a JSON file holding an array of card records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if two
    /// records share a card id.
    pub fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<StoredCard> = serde_json::from_str(&raw)?;

        let store = Self::new();
        {
            let mut cards = store
                .cards
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for record in records {
                let id = record.card.card_id.clone();
                if cards.insert(id.clone(), record).is_some() {
                    return Err(StoreError::DuplicateId(id));
                }
            }
        }

        tracing::info!(count = store.len(), path = %path.display(), "Loaded card seed file");
        Ok(store)
    }

    /// Insert or replace a card.
    pub fn insert(&self, card: impl Into<StoredCard>) {
        let record = card.into();
        let mut cards = self
            .cards
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cards.insert(record.card.card_id.clone(), record);
    }

    /// Number of stored cards, published or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a published card.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown or the card is
    /// not published.
    pub fn get_published(&self, card_id: &str) -> Result<CardView, StoreError> {
        let cards = self
            .cards
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cards
            .get(card_id)
            .filter(|record| record.card.is_published)
            .map(|record| record.card.clone())
            .ok_or_else(|| StoreError::NotFound(card_id.to_string()))
    }

    /// Increment the scan count of a published card.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown or the card is
    /// not published.
    pub fn record_view(&self, card_id: &str) -> Result<u64, StoreError> {
        let mut cards = self
            .cards
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = cards
            .get_mut(card_id)
            .filter(|record| record.card.is_published)
            .ok_or_else(|| StoreError::NotFound(card_id.to_string()))?;
        record.scan_count += 1;
        Ok(record.scan_count)
    }

    /// Current scan count for a card, published or not.
    #[must_use]
    pub fn scan_count(&self, card_id: &str) -> Option<u64> {
        self.cards
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(card_id)
            .map(|record| record.scan_count)
    }
}

#[async_trait(?Send)]
impl CardProvider for CardStore {
    async fn get_published_card(&self, public_id: &str) -> ViewerResult<CardView> {
        Ok(self.get_published(public_id)?)
    }
}

#[async_trait(?Send)]
impl Analytics for CardStore {
    async fn record_view(&self, public_id: &str) -> ViewerResult<()> {
        CardStore::record_view(self, public_id)?;
        Ok(())
    }
}
