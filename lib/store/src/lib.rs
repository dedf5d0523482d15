//! # fincabot-store
//!
//! Listing vector stores for the fincabot assistant.
//!
//! Two interchangeable backends implement the same [`ListingStore`]
//! contract and are selected by configuration at construction time:
//!
//! - [`HnswListingStore`] - approximate nearest neighbor over an in-crate
//!   HNSW graph; matches are reconstructed from flat document attributes
//! - [`FlatListingStore`] - exact brute-force scan; matches come from a
//!   full-fidelity id-keyed side table
//!
//! Both run volatile (in-process) or durable (artifact files under an
//! exclusively owned directory), pinned per instance by [`StorageMode`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use fincabot_core::DEFAULT_MODEL;
//! use fincabot_store::{create_store, BackendKind, StorageMode, StoreConfig};
//!
//! let store = create_store(&StoreConfig {
//!     backend: BackendKind::Hnsw,
//!     mode: StorageMode::Volatile,
//!     embed_model: DEFAULT_MODEL.to_string(),
//! })
//! .unwrap();
//!
//! if store.needs_loading() {
//!     // run ingestion, then store.load(&listings)
//! }
//! let matches = store.search("2 bedroom apartment with pool", 5);
//! ```

pub mod artifact;
pub mod filter;
pub mod flat_store;
pub mod hnsw;
pub mod hnsw_store;
pub mod store;

pub use filter::AttributeFilter;
pub use flat_store::FlatListingStore;
pub use hnsw::HnswIndex;
pub use hnsw_store::HnswListingStore;
pub use store::{create_store, BackendKind, ListingStore, StorageMode, StoreConfig};
