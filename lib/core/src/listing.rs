use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How the quoted price is charged: a one-time sale or a recurring rent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFrequency {
    #[default]
    Sale,
    Month,
}

impl PriceFrequency {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceFrequency::Sale => "sale",
            PriceFrequency::Month => "month",
        }
    }

    /// Lenient parse; anything that is not a recurring tag is a sale.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("month") {
            PriceFrequency::Month
        } else {
            PriceFrequency::Sale
        }
    }
}

impl fmt::Display for PriceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Language code of the description that is always populated in the feed.
pub const PRIMARY_LANGUAGE: &str = "es";

/// A normalized property record.
///
/// `id` is unique across the working set loaded into a store at any time;
/// re-loading replaces the whole set. `beds`/`baths` of `None` mean the feed
/// did not state a count - never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub date: String,
    pub reference: String,
    pub price: f64,
    pub currency: String,
    pub price_freq: PriceFrequency,
    #[serde(default)]
    pub new_build: bool,
    pub property_type: String,
    pub town: String,
    pub province: Option<String>,
    pub country: String,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    pub surface_built: Option<f64>,
    pub surface_plot: Option<f64>,
    /// Language code -> description text. Only [`PRIMARY_LANGUAGE`] is
    /// guaranteed populated.
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    /// Feed order is preserved for stable display; irrelevant for search.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub pool: bool,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Listing {
    /// The primary-language description, falling back to any populated one.
    #[must_use]
    pub fn primary_description(&self) -> &str {
        self.descriptions
            .get(PRIMARY_LANGUAGE)
            .or_else(|| self.descriptions.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// "Town, Province" with a country fallback when the province is absent.
    #[must_use]
    pub fn location(&self) -> String {
        format!(
            "{}, {}",
            self.town,
            self.province.as_deref().unwrap_or(&self.country)
        )
    }

    fn area_text(&self) -> String {
        match (self.surface_built, self.surface_plot) {
            (Some(built), Some(plot)) => format!("{built}m² built, {plot}m² plot"),
            (Some(built), None) => format!("{built}m² built"),
            (None, Some(plot)) => format!("{plot}m² plot"),
            (None, None) => "Area N/A".to_string(),
        }
    }

    fn features_text(&self) -> String {
        if self.features.is_empty() {
            "No special features".to_string()
        } else {
            self.features.join(", ")
        }
    }

    fn count_text(count: Option<u32>) -> String {
        count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
    }

    /// The text that gets embedded, and the context the summarizer sees.
    ///
    /// Field order is fixed; every field a user query can predicate on
    /// (price, beds, baths, location, features) must appear here.
    #[must_use]
    pub fn to_embedding_text(&self) -> String {
        format!(
            "Property Name: {name}\n\
             Type: {ptype}\n\
             Location: {location}\n\
             Price: {price} {currency} ({freq})\n\
             Details: {beds} bedrooms, {baths} bathrooms\n\
             Area: {area}\n\
             Features: {features}\n\
             Pool: {pool}\n\
             Description: {desc}",
            name = self.name,
            ptype = self.property_type,
            location = self.location(),
            price = self.price,
            currency = self.currency,
            freq = self.price_freq,
            beds = Self::count_text(self.beds),
            baths = Self::count_text(self.baths),
            area = self.area_text(),
            features = self.features_text(),
            pool = if self.pool { "Yes" } else { "No" },
            desc = self.primary_description(),
        )
    }

    /// Human-facing card used by the transport layer.
    #[must_use]
    pub fn to_display_text(&self) -> String {
        format!(
            "🏠 {name}\n\
             💰 Price: {price} {currency} ({freq})\n\
             📍 Location: {location}\n\
             🛏️ Bedrooms: {beds}\n\
             🚿 Bathrooms: {baths}\n\
             📐 Area: {area}\n\
             ✨ Features: {features}\n\
             🏊 Pool: {pool}\n\
             🔍 Reference: {reference}",
            name = self.name,
            price = self.price,
            currency = self.currency,
            freq = self.price_freq,
            location = self.location(),
            beds = self.beds.map_or_else(|| "N/A".to_string(), |n| n.to_string()),
            baths = self.baths.map_or_else(|| "N/A".to_string(), |n| n.to_string()),
            area = self.area_text(),
            features = self.features_text(),
            pool = if self.pool { "Yes" } else { "No" },
            reference = self.reference,
        )
    }
}

/// A listing paired with its retrieval score.
///
/// Scores are presented higher-is-better by both store backends; the raw
/// backend metrics differ and are not comparable across backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingMatch {
    pub listing: Listing,
    pub score: f32,
}
