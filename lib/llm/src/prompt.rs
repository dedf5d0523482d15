//! Prompt construction from ranked listing matches.

use fincabot_core::ListingMatch;

/// Descriptions are clipped so one verbose listing cannot crowd out the
/// others in the context window.
const DESCRIPTION_LIMIT: usize = 300;

pub fn system_prompt() -> &'static str {
    "You are a knowledgeable and helpful real estate assistant. \
     Your goal is to help users find properties that match their requirements. \
     Always be clear and concise in your recommendations while highlighting key \
     features that match the user's query. \
     If discussing prices, be sure to mention both the price and the payment \
     frequency (sale/month). \
     Be honest about both advantages and limitations of each property."
}

/// Numbered context block, one section per match.
pub fn listing_context(matches: &[ListingMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let listing = &m.listing;
            let score_percentage = (m.score * 100.0 * 10.0).round() / 10.0;
            format!(
                "Property {number} (Match score: {score_percentage}%):\n\
                 Name: {name}\n\
                 Type: {ptype}\n\
                 Location: {location}\n\
                 Price: {price} {currency} ({freq})\n\
                 Details: {beds} bedrooms, {baths} bathrooms\n\
                 Area: {area}\n\
                 Features: {features}\n\
                 Description: {desc}",
                number = i + 1,
                name = listing.name,
                ptype = listing.property_type,
                location = listing.location(),
                price = listing.price,
                currency = listing.currency,
                freq = listing.price_freq,
                beds = count(listing.beds),
                baths = count(listing.baths),
                area = listing
                    .surface_built
                    .map_or_else(|| "N/A".to_string(), |a| format!("{a}m² built")),
                features = if listing.features.is_empty() {
                    "None listed".to_string()
                } else {
                    listing.features.join(", ")
                },
                desc = clip(listing.primary_description()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The user-role message combining the query with the retrieved context.
pub fn user_prompt(query: &str, matches: &[ListingMatch]) -> String {
    format!(
        "User Query: {query}\n\n\
         Available properties:\n{context}\n\n\
         Please analyze these properties and suggest the best matches for the \
         user's requirements.",
        context = listing_context(matches),
    )
}

fn count(value: Option<u32>) -> String {
    value.map_or_else(|| "N/A".to_string(), |n| n.to_string())
}

/// Clip on a character boundary; descriptions are UTF-8 Spanish text.
fn clip(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(DESCRIPTION_LIMIT).collect();
        format!("{clipped}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincabot_core::{Listing, PriceFrequency};
    use std::collections::BTreeMap;

    fn matches() -> Vec<ListingMatch> {
        vec![ListingMatch {
            listing: Listing {
                id: "1".to_string(),
                reference: "GM-1".to_string(),
                price: 140_000.0,
                currency: "EUR".to_string(),
                price_freq: PriceFrequency::Sale,
                property_type: "Apartment".to_string(),
                town: "Guardamar".to_string(),
                province: Some("Alicante".to_string()),
                country: "Spain".to_string(),
                beds: Some(2),
                baths: Some(1),
                surface_built: Some(75.0),
                descriptions: BTreeMap::from([(
                    "es".to_string(),
                    "Apartamento cerca de la playa".to_string(),
                )]),
                features: vec!["Terrace".to_string()],
                name: "Beachside apartment".to_string(),
                ..Listing::default()
            },
            score: 0.87,
        }]
    }

    #[test]
    fn test_context_carries_query_predicates() {
        let context = listing_context(&matches());
        assert!(context.contains("Property 1 (Match score: 87%)"));
        assert!(context.contains("140000 EUR (sale)"));
        assert!(context.contains("2 bedrooms, 1 bathrooms"));
        assert!(context.contains("Guardamar, Alicante"));
        assert!(context.contains("Terrace"));
    }

    #[test]
    fn test_long_descriptions_are_clipped() {
        let mut matched = matches();
        matched[0]
            .listing
            .descriptions
            .insert("es".to_string(), "á".repeat(500));

        let context = listing_context(&matched);
        assert!(context.contains(&format!("{}...", "á".repeat(300))));
    }

    #[test]
    fn test_user_prompt_includes_query() {
        let prompt = user_prompt("2 bedroom apartment with terrace", &matches());
        assert!(prompt.starts_with("User Query: 2 bedroom apartment with terrace"));
        assert!(prompt.contains("Available properties:"));
    }
}
