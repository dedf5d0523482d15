use crate::error::LlmError;
use async_trait::async_trait;
use fincabot_core::ListingMatch;

/// A pluggable text-generation capability: turn a user query and its ranked
/// matches into a prose recommendation.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, query: &str, matches: &[ListingMatch]) -> Result<String, LlmError>;
}
