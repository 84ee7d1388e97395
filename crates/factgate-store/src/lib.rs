//! Factgate Fact Store Loader
//!
//! Builds the immutable set of permissible facts for one publishing cycle from
//! the upstream data snapshot, and implements [`factgate_domain::FactLookup`]
//! over it.
//!
//! # Architecture
//!
//! - The snapshot is converted to a [`SnapshotValue`] tree and walked by a
//!   visitor; every nesting level contributes
//! - Numbers are stored as canonical literals (and at one and two decimals of
//!   display precision) plus sorted value sets for tolerance lookup
//! - Percent-keyed fields are also stored in percent form; `_decimal` fields are
//!   converted to percent units
//! - A ticker index maps symbols to price, change, timestamp and multiples
//!
//! # Examples
//!
//! ```
//! use factgate_domain::FactLookup;
//! use factgate_store::FactStore;
//!
//! let store = FactStore::from_json_str(r#"{"NVDA": {"price": 188.12, "change_pct": -0.386}}"#).unwrap();
//! assert!(store.has_literal("188.12"));
//! assert_eq!(store.ticker("NVDA").and_then(|t| t.price), Some(188.12));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod normalize;
pub mod snapshot;
mod store;

pub use error::StoreError;
pub use snapshot::{walk, SnapshotValue, SnapshotVisitor};
pub use store::{FactStore, FactSummary};
