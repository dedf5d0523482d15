//! # fincabot
//!
//! A conversational property-search assistant: it ingests an XML listing
//! feed, embeds every listing into a semantic vector space, and answers
//! free-text queries by retrieving the most relevant listings and
//! summarizing them with a language model.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! fincabot --feed ./data/listings.xml --storage-mode disk --llm openai
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use fincabot::prelude::*;
//!
//! // Build a store
//! let store = create_store(&StoreConfig {
//!     backend: BackendKind::Hnsw,
//!     mode: StorageMode::Volatile,
//!     embed_model: DEFAULT_MODEL.to_string(),
//! })
//! .unwrap();
//!
//! // Ingest the feed, then query
//! let listings = fincabot_feed::parse_feed("<root></root>").unwrap();
//! if !listings.is_empty() {
//!     store.load(&listings).unwrap();
//! }
//! let matches = store.search("2 bedroom apartment with pool", 5);
//! ```
//!
//! ## Crate Structure
//!
//! - `fincabot-core` - listing domain model, document codec, text embedder
//! - `fincabot-store` - the vector-store contract and its two backends
//!   (approximate HNSW index, exact flat index), volatile or durable
//! - `fincabot-feed` - XML feed parsing into validated listings
//! - `fincabot-llm` - response generation from ranked matches
//! - `fincabot-api` - thin REST chat transport

// Re-export core types
pub use fincabot_core::{
    codec, Error, Listing, ListingMatch, PriceFrequency, Result, SearchDocument, TextEmbedder,
    Vector, DEFAULT_MODEL,
};

// Re-export the store surface
pub use fincabot_store::{
    create_store, AttributeFilter, BackendKind, FlatListingStore, HnswListingStore, ListingStore,
    StorageMode, StoreConfig,
};

// Re-export feed parsing
pub use fincabot_feed::{load_listings, parse_feed};

// Re-export response generation
pub use fincabot_llm::{ClaudeGenerator, LlmError, OpenAiGenerator, ResponseGenerator};

// Re-export the transport
pub use fincabot_api::{AppContext, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        codec, create_store, AppContext, BackendKind, Error, FlatListingStore, HnswListingStore,
        Listing, ListingMatch, ListingStore, PriceFrequency, RestApi, Result, StorageMode,
        StoreConfig, TextEmbedder, DEFAULT_MODEL,
    };
}
