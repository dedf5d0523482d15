//! # fincabot-feed
//!
//! Parses the upstream XML property feed into validated [`Listing`]
//! records. A record that fails validation is logged and skipped; only a
//! file-level I/O or XML syntax failure is an error. An empty result is not
//! an error here - the store refuses empty loads, which is the backstop
//! against serving an index built from a broken feed.

use fincabot_core::{Error, Listing, PriceFrequency, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Raw feed document. All leaf fields are strings so a single malformed
/// value degrades to one skipped record instead of failing the whole file.
#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(rename = "property", default)]
    properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    id: Option<String>,
    date: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
    price: Option<String>,
    currency: Option<String>,
    price_freq: Option<String>,
    new_build: Option<String>,
    #[serde(rename = "type")]
    property_type: Option<String>,
    town: Option<String>,
    province: Option<String>,
    country: Option<String>,
    beds: Option<String>,
    baths: Option<String>,
    surface_area: Option<RawSurface>,
    desc: Option<RawDesc>,
    features: Option<RawFeatures>,
    pool: Option<String>,
    property_name: Option<String>,
    images: Option<RawImages>,
}

#[derive(Debug, Deserialize)]
struct RawSurface {
    built: Option<String>,
    plot: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDesc {
    es: Option<String>,
    en: Option<String>,
    fr: Option<String>,
    de: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeatures {
    #[serde(rename = "feature", default)]
    features: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    #[serde(rename = "image", default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: Option<String>,
}

/// Load and parse listings from an XML feed file.
pub fn load_listings(path: &Path) -> Result<Vec<Listing>> {
    let xml = std::fs::read_to_string(path)?;
    parse_feed(&xml)
}

/// Parse listings from feed XML.
pub fn parse_feed(xml: &str) -> Result<Vec<Listing>> {
    let raw: RawFeed =
        quick_xml::de::from_str(xml).map_err(|e| Error::Feed(e.to_string()))?;

    Ok(raw
        .properties
        .into_iter()
        .filter_map(validate)
        .collect())
}

fn validate(raw: RawProperty) -> Option<Listing> {
    let id = match raw.id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            warn!("Skipping property without an id");
            return None;
        }
    };

    let price = match raw.price.as_deref().and_then(|p| p.parse::<f64>().ok()) {
        Some(price) => price,
        None => {
            warn!("Skipping property {id}: missing or unparsable price");
            return None;
        }
    };

    let town = match raw.town.filter(|t| !t.is_empty()) {
        Some(town) => town,
        None => {
            warn!("Skipping property {id}: missing town");
            return None;
        }
    };

    let property_type = raw.property_type.unwrap_or_default();
    let name = raw
        .property_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{property_type} in {town}").trim().to_string());

    let mut descriptions = BTreeMap::new();
    if let Some(desc) = raw.desc {
        for (lang, text) in [
            ("es", desc.es),
            ("en", desc.en),
            ("fr", desc.fr),
            ("de", desc.de),
        ] {
            if let Some(text) = text.filter(|t| !t.is_empty()) {
                descriptions.insert(lang.to_string(), text);
            }
        }
    }

    Some(Listing {
        id,
        date: raw.date.unwrap_or_default(),
        reference: raw.reference.unwrap_or_default(),
        price,
        currency: raw.currency.unwrap_or_else(|| "EUR".to_string()),
        price_freq: PriceFrequency::parse(raw.price_freq.as_deref().unwrap_or("sale")),
        new_build: parse_flag(raw.new_build.as_deref()),
        property_type,
        town,
        province: raw.province.filter(|p| !p.is_empty()),
        country: raw.country.unwrap_or_default(),
        beds: parse_count(raw.beds.as_deref()),
        baths: parse_count(raw.baths.as_deref()),
        surface_built: raw
            .surface_area
            .as_ref()
            .and_then(|s| parse_area(s.built.as_deref())),
        surface_plot: raw
            .surface_area
            .as_ref()
            .and_then(|s| parse_area(s.plot.as_deref())),
        descriptions,
        features: raw
            .features
            .map(|f| f.features.into_iter().filter(|f| !f.is_empty()).collect())
            .unwrap_or_default(),
        pool: parse_flag(raw.pool.as_deref()),
        name,
        images: raw
            .images
            .map(|imgs| imgs.images.into_iter().filter_map(|i| i.url).collect())
            .unwrap_or_default(),
    })
}

/// The feed writes flags as "0"/"1", occasionally "true"/"false".
fn parse_flag(s: Option<&str>) -> bool {
    matches!(s, Some("1") | Some("true") | Some("True"))
}

/// Zero or unparsable counts are treated as not stated.
fn parse_count(s: Option<&str>) -> Option<u32> {
    match s?.trim().parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

fn parse_area(s: Option<&str>) -> Option<f64> {
    s?.trim().parse::<f64>().ok().filter(|v| *v > 0.0)
}
