//! # fincabot-core
//!
//! Core library for the fincabot property-search assistant.
//!
//! This crate provides the domain model and the pure transforms the rest of
//! the system is built on:
//!
//! - [`Listing`] - the normalized property record, with its embedding-text
//!   projection and display card
//! - [`codec`] - the lossy Listing <-> flat-attribute-map codec used by the
//!   index storage layer
//! - [`TextEmbedder`] - the deterministic trigram/word-hash embedder
//! - [`Vector`] - dense vector math
//!
//! ## Example
//!
//! ```rust
//! use fincabot_core::{codec, Listing, TextEmbedder, DEFAULT_MODEL};
//!
//! let listing = Listing {
//!     id: "1".to_string(),
//!     name: "Beachside apartment".to_string(),
//!     town: "Guardamar".to_string(),
//!     ..Listing::default()
//! };
//!
//! let document = codec::encode(&listing);
//! let embedder = TextEmbedder::new(DEFAULT_MODEL).unwrap();
//! let vector = embedder.embed(&document.text);
//! assert_eq!(vector.dim(), embedder.dim());
//! ```

pub mod codec;
pub mod embedder;
pub mod error;
pub mod listing;
pub mod vector;

pub use codec::SearchDocument;
pub use embedder::{EmbeddingModel, TextEmbedder, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use listing::{Listing, ListingMatch, PriceFrequency, PRIMARY_LANGUAGE};
pub use vector::Vector;
