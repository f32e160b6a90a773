//! Per-session staging area for purchases and returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Reservations keyed by item name. Never touches the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    reservations: BTreeMap<String, u64>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `qty` units to the reservation for `name`, returning the new total.
    pub fn reserve(&mut self, name: &str, qty: u64) -> CatalogResult<u64> {
        if qty == 0 {
            return Err(CatalogError::validation(format!(
                "reservation for {name} must be positive"
            )));
        }
        let reserved = self.reservations.entry(name.to_string()).or_insert(0);
        *reserved = reserved.saturating_add(qty);
        Ok(*reserved)
    }

    /// Remove `qty` units from the reservation for `name`, returning what remains.
    ///
    /// Entries driven to zero are deleted; releasing an unknown name is a no-op.
    pub fn release(&mut self, name: &str, qty: u64) -> CatalogResult<u64> {
        if qty == 0 {
            return Err(CatalogError::validation(format!(
                "release for {name} must be positive"
            )));
        }
        let Some(reserved) = self.reservations.get_mut(name) else {
            return Ok(0);
        };
        if *reserved <= qty {
            self.reservations.remove(name);
            return Ok(0);
        }
        *reserved -= qty;
        Ok(*reserved)
    }

    /// Name-ordered copy of every reservation.
    pub fn contents(&self) -> Vec<(String, u64)> {
        self.reservations
            .iter()
            .map(|(name, qty)| (name.clone(), *qty))
            .collect()
    }

    /// Units reserved for `name` (0 when absent).
    pub fn reserved(&self, name: &str) -> u64 {
        self.reservations.get(name).copied().unwrap_or(0)
    }

    /// Drop every reservation.
    pub fn clear(&mut self) {
        self.reservations.clear();
    }

    /// Number of distinct items reserved.
    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    /// True when nothing is reserved.
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Units reserved across all items.
    pub fn total_units(&self) -> u64 {
        self.reservations
            .values()
            .fold(0u64, |acc, qty| acc.saturating_add(*qty))
    }
}

/// Builds a cart by accumulating quantities per name. Zero quantities are skipped.
impl FromIterator<(String, u64)> for Cart {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut reservations = BTreeMap::new();
        for (name, qty) in iter.into_iter().filter(|(_, qty)| *qty > 0) {
            let reserved: &mut u64 = reservations.entry(name).or_insert(0);
            *reserved = reserved.saturating_add(qty);
        }
        Self { reservations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_accumulates() {
        let mut cart = Cart::new();
        assert_eq!(cart.reserve("Sword", 1).ok(), Some(1));
        assert_eq!(cart.reserve("Sword", 2).ok(), Some(3));
        assert_eq!(cart.reserved("Sword"), 3);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn zero_quantities_are_rejected() {
        let mut cart = Cart::new();
        assert!(matches!(cart.reserve("Sword", 0), Err(CatalogError::Validation(_))));
        assert!(matches!(cart.release("Sword", 0), Err(CatalogError::Validation(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn release_deletes_exhausted_entries() {
        let mut cart = Cart::new();
        cart.reserve("Boots", 3).expect("reserve");
        assert_eq!(cart.release("Boots", 1).ok(), Some(2));
        assert_eq!(cart.release("Boots", 5).ok(), Some(0));
        assert_eq!(cart.reserved("Boots"), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.release("Boots", 1).ok(), Some(0));
    }

    #[test]
    fn reserve_then_release_restores_prior_state() {
        let mut cart = Cart::new();
        cart.reserve("Axe", 1).expect("reserve");
        let before = cart.clone();

        cart.reserve("Sword", 4).expect("reserve");
        cart.release("Sword", 4).expect("release");
        assert_eq!(cart, before);

        cart.reserve("Axe", 2).expect("reserve");
        cart.release("Axe", 2).expect("release");
        assert_eq!(cart, before);
    }

    #[test]
    fn contents_are_name_ordered() {
        let mut cart = Cart::new();
        cart.reserve("Sword", 1).expect("reserve");
        cart.reserve("Axe", 2).expect("reserve");
        cart.reserve("Chainmail", 3).expect("reserve");
        assert_eq!(
            cart.contents(),
            vec![
                ("Axe".to_string(), 2),
                ("Chainmail".to_string(), 3),
                ("Sword".to_string(), 1)
            ]
        );
        assert_eq!(cart.total_units(), 6);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn collecting_accumulates_and_skips_zero() {
        let cart: Cart = [
            ("Sword".to_string(), 1),
            ("Boots".to_string(), 0),
            ("Sword".to_string(), 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(cart.contents(), vec![("Sword".to_string(), 3)]);
    }
}
