// Attribute filter over the flat document maps. Not used by the chat query
// surface; kept for callers that need metadata-constrained retrieval.
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum AttributeFilter {
    Equals { key: String, value: String },
    Contains { key: String, value: String },
    And(Vec<AttributeFilter>),
}

impl AttributeFilter {
    pub fn matches(&self, attributes: &BTreeMap<String, String>) -> bool {
        match self {
            AttributeFilter::Equals { key, value } => {
                attributes.get(key).map(|v| v == value).unwrap_or(false)
            }
            AttributeFilter::Contains { key, value } => attributes
                .get(key)
                .map(|v| v.contains(value.as_str()))
                .unwrap_or(false),
            AttributeFilter::And(filters) => filters.iter().all(|f| f.matches(attributes)),
        }
    }
}
