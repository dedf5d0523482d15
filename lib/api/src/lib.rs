//! # fincabot-api
//!
//! Thin REST chat transport for the fincabot assistant. The transport does
//! no retrieval or generation of its own: it holds an [`AppContext`] with
//! the store and the optional response generator, translates HTTP requests
//! into `search`/`generate` calls, and formats the results.

pub mod rest;

pub use rest::{AppContext, RestApi};
