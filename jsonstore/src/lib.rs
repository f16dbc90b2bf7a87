//! # jsonstore - Embedded Offline-First JSON Document Store
//!
//! jsonstore is a lightweight, embedded document store for offline-first
//! applications. Callers keep JSON documents in named collections, declare
//! which fields are searchable, and let the store track local changes so a
//! sync layer can push them to a remote service later.
//!
//! ## Key Features
//!
//! - **Embedded**: No separate server process required
//! - **Collections**: Named document sets with declared search fields
//! - **Secondary Indexing**: Dotted-path extraction of searchable values,
//!   transparent through arrays and nested objects
//! - **Two Query Models**: Simple equality queries and advanced operator
//!   queries (ranges, sets, substring anchors)
//! - **Offline Change Tracking**: Per-document dirty flags and operation tags
//!   (insert/update/delete), with soft deletes that survive until a sync
//!   marks them clean
//! - **Transactions**: Caller transactions spanning every collection, plus
//!   implicit transactions around atomic batch writes
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interfaces
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jsonstore::JsonStore;
//! use jsonstore::collection::ProvisionOptions;
//! use jsonstore::query::SimpleQuery;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = JsonStore::builder().store_name("app").open()?;
//! store.open_collections(&[
//!     ProvisionOptions::new("people")
//!         .search_field("name", "string")
//!         .search_field("age", "integer"),
//! ])?;
//!
//! let people = store.collection("people")?;
//! people.add_data(&[json!({"name": "carlos", "age": 99})], true, &Default::default())?;
//!
//! let query = SimpleQuery::from_value(&json!({"name": "carlos"}))?;
//! let results = people.find_with_queries(&[query], &Default::default())?;
//!
//! store.close_all_collections()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Collections, documents, and batch write operations
//! - [`common`] - Constants and store-wide locking
//! - [`errors`] - Error types and result definitions
//! - [`index`] - Search-field schemas and index value extraction
//! - [`query`] - Simple and advanced query models
//! - [`store`] - Storage backends and transaction primitives

pub mod collection;
pub mod common;
pub mod errors;
pub mod index;
pub mod query;
pub mod store;

mod json_store;
mod json_store_builder;

pub use json_store::JsonStore;
pub use json_store_builder::JsonStoreBuilder;
