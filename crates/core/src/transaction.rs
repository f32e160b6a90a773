//! Applies carts to the catalog as sales or returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    cart::Cart,
    catalog::{CatalogStore, ReduceOutcome},
    error::{CatalogError, CatalogResult},
};

/// One line of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    /// Item name.
    pub name: String,
    /// Units sold; never more than were in stock.
    pub quantity: u64,
    /// Unit price observed when the stock was taken (0 when the item was missing).
    pub unit_price: u64,
    /// The sale consumed the remaining stock and removed the entry.
    pub sold_out: bool,
    /// The item was no longer in the catalog.
    pub missing: bool,
}

impl ReceiptLine {
    /// Unit price times quantity.
    pub fn subtotal(&self) -> u64 {
        self.unit_price.saturating_mul(self.quantity)
    }
}

/// Record of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Lines in name order.
    pub lines: Vec<ReceiptLine>,
    /// When the sale was committed.
    pub completed_at: DateTime<Utc>,
}

impl Receipt {
    /// Grand total across all lines.
    pub fn total(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.subtotal()))
    }

    /// Rebuild a cart of the units actually sold, e.g. to return the purchase.
    ///
    /// Lines for items that were missing at sale time are skipped.
    pub fn to_cart(&self) -> Cart {
        self.lines
            .iter()
            .filter(|line| !line.missing)
            .map(|line| (line.name.clone(), line.quantity))
            .collect()
    }
}

/// Storefront-level orchestration between carts and the catalog.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    store: CatalogStore,
}

impl TransactionCoordinator {
    /// Coordinate sales and returns against `store`.
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// The catalog this coordinator mutates.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Reduce the catalog by every reservation. Does not re-validate and does not clear the cart.
    pub fn sale(&self, cart: &Cart) -> Receipt {
        let lines = cart
            .contents()
            .into_iter()
            .map(|(name, quantity)| match self.store.reduce(&name, quantity) {
                ReduceOutcome::Reduced { item, .. } => ReceiptLine {
                    unit_price: item.price(),
                    name,
                    quantity,
                    sold_out: false,
                    missing: false,
                },
                ReduceOutcome::SoldOut { item } => {
                    let sold = quantity.min(item.quantity());
                    if sold < quantity {
                        warn!(item = %name, requested = quantity, sold, "Sale exceeded stock");
                    }
                    ReceiptLine {
                        unit_price: item.price(),
                        name,
                        quantity: sold,
                        sold_out: true,
                        missing: false,
                    }
                }
                ReduceOutcome::Missing => {
                    warn!(item = %name, quantity, "Sold item missing from catalog");
                    ReceiptLine {
                        name,
                        quantity,
                        unit_price: 0,
                        sold_out: false,
                        missing: true,
                    }
                }
            })
            .collect::<Vec<_>>();

        let receipt = Receipt {
            lines,
            completed_at: Utc::now(),
        };
        info!(
            lines = receipt.lines.len(),
            total = receipt.total(),
            "Sale committed"
        );
        receipt
    }

    /// Return every reservation to the catalog, whether or not it was sold.
    ///
    /// Returns the number of units reinstated. Does not clear the cart.
    pub fn cancel(&self, cart: &Cart) -> u64 {
        let mut returned = 0u64;
        for (name, quantity) in cart.contents() {
            self.store.increase(&name, quantity);
            returned = returned.saturating_add(quantity);
        }
        info!(units = returned, "Cart returned to catalog");
        returned
    }

    /// Reserve `qty` of `name` only if live stock covers the cart's total reservation.
    pub fn stage(&self, cart: &mut Cart, name: &str, qty: u64) -> CatalogResult<u64> {
        let item = self
            .store
            .get(name)
            .ok_or_else(|| CatalogError::unknown_item(name))?;
        let requested = cart.reserved(name).saturating_add(qty);
        if requested > item.quantity() {
            return Err(CatalogError::InsufficientStock {
                name: name.to_string(),
                requested,
                available: item.quantity(),
            });
        }
        cart.reserve(name, qty)
    }

    /// Check every reservation against live stock.
    pub fn check_availability(&self, cart: &Cart) -> CatalogResult<()> {
        let snapshot = self.store.snapshot();
        for (name, requested) in cart.contents() {
            let available = snapshot.get(&name).map(|item| item.quantity());
            match available {
                None => return Err(CatalogError::UnknownItem(name)),
                Some(available) if requested > available => {
                    return Err(CatalogError::InsufficientStock {
                        name,
                        requested,
                        available,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
