#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Armory storefront.
//!
//! This crate hosts the item model, the shared catalog store, carts and
//! the transaction coordinator, catalog document loading, configuration,
//! and the admin command channel used by the storefront and the admin
//! console.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod transaction;

pub use admin::{AdminClient, AdminEvent, AdminHandle, AdminServer, AdminService, ServerState};
pub use cart::Cart;
pub use catalog::{CatalogSnapshot, CatalogStore, ReduceOutcome};
pub use self::config::AppConfig;
pub use document::{CatalogDocument, FileUpdateSource, UpdateSource};
pub use error::{CatalogError, CatalogResult};
pub use models::{Item, ItemKind, ItemRecord};
pub use transaction::{Receipt, ReceiptLine, TransactionCoordinator};
