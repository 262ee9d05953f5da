//! Suggestion fetching for settled input.

use std::sync::Arc;

use address_engine_geocoder::GeocodingProvider;
use address_engine_models::{Query, SuggestionOption};

use crate::SearchError;

/// Issues one provider query per settled input.
///
/// Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct SuggestionFetcher {
    provider: Arc<dyn GeocodingProvider>,
    limit: usize,
}

impl SuggestionFetcher {
    /// Creates a fetcher returning at most `limit` options per query.
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodingProvider>, limit: usize) -> Self {
        Self { provider, limit }
    }

    /// Fetches options for `query`. Exactly one provider call, no retry.
    ///
    /// # Errors
    ///
    /// * [`SearchError::Network`] if the request fails or is refused
    /// * [`SearchError::Provider`] if the response cannot be parsed
    pub async fn search(&self, query: &Query) -> Result<Vec<SuggestionOption>, SearchError> {
        log::debug!(
            "Searching {} via {}: {:?}",
            query.sequence,
            self.provider.id(),
            query.text
        );

        let mut options = self
            .provider
            .suggest(&query.text, self.limit)
            .await
            .map_err(|e| {
                log::warn!("Search {} failed: {e}", query.sequence);
                SearchError::from(e)
            })?;

        options.truncate(self.limit);
        Ok(options)
    }
}
