//! Thread-safe catalog of salable items.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{document::CatalogDocument, models::Item};

/// Result of a [`CatalogStore::reduce`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceOutcome {
    /// Stock was decremented and the entry kept.
    Reduced {
        /// Units left in stock.
        remaining: u64,
        /// Item as stored after the reduction.
        item: Item,
    },
    /// The reduction met or exceeded the stock; the entry was removed.
    SoldOut {
        /// Item as it was just before removal.
        item: Item,
    },
    /// No entry with that name.
    Missing,
}

/// Shared handle over the catalog. Clones observe and mutate the same state.
///
/// Every operation holds the store lock for its whole read-modify-write, so
/// operations are atomic with respect to one another.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    inner: Arc<RwLock<BTreeMap<String, Item>>>,
}

impl CatalogStore {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a loaded document, merging duplicate names.
    pub fn from_document(document: CatalogDocument) -> Self {
        let store = Self::new();
        store.merge(document);
        store
    }

    /// Add an item, accumulating quantity when the name already exists.
    pub fn add(&self, item: Item) -> u64 {
        let mut items = self.inner.write();
        accumulate(&mut items, item)
    }

    /// Increase stock by name, inserting a bare entry when the name is absent.
    pub fn increase(&self, name: &str, amount: u64) -> u64 {
        let mut items = self.inner.write();
        match items.get_mut(name) {
            Some(stored) => stored.add_quantity(amount),
            None => {
                items.insert(name.to_string(), Item::bare(name, amount));
                amount
            }
        }
    }

    /// Reduce stock by name. A reduction that meets or exceeds the stock removes the entry.
    pub fn reduce(&self, name: &str, amount: u64) -> ReduceOutcome {
        let mut items = self.inner.write();
        let Some(stored) = items.get_mut(name) else {
            return ReduceOutcome::Missing;
        };
        if stored.quantity() > amount {
            let remaining = stored.take_quantity(amount);
            return ReduceOutcome::Reduced {
                remaining,
                item: stored.clone(),
            };
        }
        match items.remove(name) {
            Some(item) => {
                info!(item = %name, requested = amount, "Item sold out");
                ReduceOutcome::SoldOut { item }
            }
            None => ReduceOutcome::Missing,
        }
    }

    /// Unconditionally remove an entry.
    pub fn remove_by_name(&self, name: &str) -> Option<Item> {
        self.inner.write().remove(name)
    }

    /// Merge every entry of a document through [`CatalogStore::add`] under one lock.
    pub fn merge(&self, document: CatalogDocument) -> usize {
        let mut items = self.inner.write();
        let mut merged = 0;
        for item in document.into_items() {
            accumulate(&mut items, item);
            merged += 1;
        }
        info!(merged, total = items.len(), "Catalog merged");
        merged
    }

    /// Point-in-time copy of the catalog, ordered by name.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            items: self.inner.read().clone(),
        }
    }

    /// Copy of a single entry.
    pub fn get(&self, name: &str) -> Option<Item> {
        self.inner.read().get(name).cloned()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True when the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

fn accumulate(items: &mut BTreeMap<String, Item>, item: Item) -> u64 {
    match items.get_mut(item.name()) {
        Some(stored) => {
            let quantity = stored.add_quantity(item.quantity());
            debug!(item = %item.name(), quantity, "Accumulated stock");
            quantity
        }
        None => {
            let quantity = item.quantity();
            debug!(item = %item.name(), quantity, "Inserted item");
            items.insert(item.name().to_string(), item);
            quantity
        }
    }
}

/// Immutable, name-ordered view of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    items: BTreeMap<String, Item>,
}

impl CatalogSnapshot {
    /// Iterate items in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items as an owned, name-ordered vector.
    pub fn to_vec(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }

    /// Convert into a document suitable for dumping or re-merging.
    pub fn into_document(self) -> CatalogDocument {
        CatalogDocument::from_items(self.items.into_values())
    }
}
