//! Inventory item records kept in a single JSON document on disk.
//!
//! The store holds an ordered list of open-ended item objects, hands each new
//! one a unique `backendId`, merges partial updates field by field, and
//! rewrites the whole file atomically (temp file + rename) before any mutation
//! reports success.
//!
//! ```rust,no_run
//! use inventory_store::{InventoryStore, Item};
//! use serde_json::json;
//!
//! let store = InventoryStore::open("db.json").unwrap();
//! let bolt = store
//!     .append(Item::new().with("item_id", "sku-1").with("item_name", "Bolt"))
//!     .unwrap();
//! let id = bolt.backend_id().unwrap();
//! store
//!     .merge_update(id, json!({"total_stock": 5}).as_object().unwrap())
//!     .unwrap();
//! store.remove(id).unwrap();
//! ```
//!
//! [`api`] maps REST-style requests onto the store without tying you to an
//! HTTP framework.
//!
//! **Single-process only.** Another process replacing the file between two of
//! our writes will lose one side's changes. [`InventoryStore::refresh`] narrows
//! that window; it does not close it.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod id;
pub mod item;
pub mod persist;
pub mod serializer;
pub mod store;

pub use error::{Error, Result};
pub use item::Item;
pub use store::{CorruptPolicy, InventoryStore, InventoryStoreBuilder};
