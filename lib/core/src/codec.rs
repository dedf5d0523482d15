//! Document codec
//!
//! Converts a [`Listing`] into a searchable document - the embedding text
//! plus a flat, string-keyed attribute map - and reconstructs a listing
//! from a stored attribute map on retrieval.
//!
//! The flat map exists because the index storage layer only accepts
//! primitive scalars. Flattening is lossy by construction:
//!
//! - an empty list and "no data" both encode to the empty string;
//! - absent optional numbers encode to a zero sentinel (`"0"` / `"0.0"`)
//!   so the key is never dropped, and the zero reads back as `None`;
//! - only the primary-language description survives;
//! - types are re-inferred heuristically on read, and a feature tag that
//!   itself contains `", "` will mis-split. Accepted limitations, not
//!   silently repaired.

use crate::listing::{Listing, PriceFrequency, PRIMARY_LANGUAGE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator used to flatten lists into a single scalar string.
pub const LIST_SEPARATOR: &str = ", ";

/// A listing projected into storable form. Derived, never persisted on its
/// own; the attribute map holds only primitive scalar strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

/// Project a listing into its searchable document.
#[must_use]
pub fn encode(listing: &Listing) -> SearchDocument {
    let mut attributes = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        attributes.insert(key.to_string(), value);
    };

    put("id", listing.id.clone());
    put("date", listing.date.clone());
    put("ref", listing.reference.clone());
    put("price", listing.price.to_string());
    put("currency", listing.currency.clone());
    put("price_freq", listing.price_freq.as_str().to_string());
    put("new_build", bool_str(listing.new_build));
    put("type", listing.property_type.clone());
    put("town", listing.town.clone());
    put("province", listing.province.clone().unwrap_or_default());
    put("country", listing.country.clone());
    put("beds", opt_count_str(listing.beds));
    put("baths", opt_count_str(listing.baths));
    put("surface_built", opt_float_str(listing.surface_built));
    put("surface_plot", opt_float_str(listing.surface_plot));
    put("desc", listing.primary_description().to_string());
    put("features", listing.features.join(LIST_SEPARATOR));
    put("pool", bool_str(listing.pool));
    put("name", listing.name.clone());
    put("images", listing.images.join(LIST_SEPARATOR));

    SearchDocument {
        text: listing.to_embedding_text(),
        attributes,
    }
}

/// Rebuild a listing from a flat attribute map.
///
/// Heuristic inverse of [`encode`]: applied per key, with the zero and
/// empty-string sentinels mapping back to `None`/empty.
#[must_use]
pub fn decode(attributes: &BTreeMap<String, String>) -> Listing {
    let get = |key: &str| attributes.get(key).map(String::as_str).unwrap_or("");

    let descriptions = match get("desc") {
        "" => BTreeMap::new(),
        text => BTreeMap::from([(PRIMARY_LANGUAGE.to_string(), text.to_string())]),
    };

    Listing {
        id: get("id").to_string(),
        date: get("date").to_string(),
        reference: get("ref").to_string(),
        price: get("price").parse().unwrap_or(0.0),
        currency: get("currency").to_string(),
        price_freq: PriceFrequency::parse(get("price_freq")),
        new_build: parse_bool(get("new_build")),
        property_type: get("type").to_string(),
        town: get("town").to_string(),
        province: opt_string(get("province")),
        country: get("country").to_string(),
        beds: opt_count(get("beds")),
        baths: opt_count(get("baths")),
        surface_built: opt_float(get("surface_built")),
        surface_plot: opt_float(get("surface_plot")),
        descriptions,
        features: split_list(get("features")),
        pool: parse_bool(get("pool")),
        name: get("name").to_string(),
        images: split_list(get("images")),
    }
}

fn bool_str(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

fn opt_count_str(value: Option<u32>) -> String {
    value.map_or_else(|| "0".to_string(), |n| n.to_string())
}

fn opt_float_str(value: Option<f64>) -> String {
    value.map_or_else(|| "0.0".to_string(), |n| n.to_string())
}

fn opt_string(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Zero is the absence sentinel: real counts are never zero.
fn opt_count(s: &str) -> Option<u32> {
    match s.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

fn opt_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| *v != 0.0)
}

fn parse_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true")
}

/// Empty string means empty list, not a single empty element.
fn split_list(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(LIST_SEPARATOR).map(str::to_string).collect()
    }
}
