//! Submit-time geocode resolution.
//!
//! Resolution runs at most two provider queries: a structured query first,
//! then a loose free-text query if the structured one found nothing.
//! Transport failures abort immediately; malformed responses are logged and
//! treated as "no match" so the fallback still gets its chance.

use std::sync::Arc;

use address_engine_geocoder::{
    ErrorKind, GeocodeError, GeocodeMatch, GeocodingProvider, QueryStrategy,
};
use address_engine_models::Coordinates;

use crate::ResolveError;
use crate::normalize::{normalize, normalized_len};

/// Resolves a submitted address to coordinates.
#[derive(Clone)]
pub struct GeocodeResolver {
    provider: Arc<dyn GeocodingProvider>,
    min_length: usize,
}

impl GeocodeResolver {
    /// Creates a resolver that rejects addresses shorter than `min_length`
    /// normalized characters.
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodingProvider>, min_length: usize) -> Self {
        Self {
            provider,
            min_length,
        }
    }

    /// Resolves `raw` to coordinates.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::InvalidInput`] if the normalized text is too short
    ///   (no provider call is made)
    /// * [`ResolveError::NotFound`] if neither query found a match
    /// * [`ResolveError::Network`] if a query failed in transport
    pub async fn resolve(&self, raw: &str) -> Result<Coordinates, ResolveError> {
        let length = normalized_len(raw);
        if length < self.min_length {
            log::debug!("Not resolving {raw:?}: {length} < {} chars", self.min_length);
            return Err(ResolveError::InvalidInput {
                length,
                minimum: self.min_length,
            });
        }

        let text = normalize(raw);
        for strategy in [QueryStrategy::Structured, QueryStrategy::Loose] {
            if let Some(found) = self.attempt(&text, strategy).await? {
                log::info!(
                    "Resolved {text:?} via {} query: {} ({})",
                    strategy.as_str(),
                    found.label.as_deref().unwrap_or("unlabelled"),
                    found.coordinates
                );
                return Ok(found.coordinates);
            }
            log::debug!("No {} match for {text:?}", strategy.as_str());
        }

        log::info!("Address not found: {text:?}");
        Err(ResolveError::NotFound)
    }

    async fn attempt(
        &self,
        text: &str,
        strategy: QueryStrategy,
    ) -> Result<Option<GeocodeMatch>, ResolveError> {
        match self.provider.geocode(text, strategy).await {
            Ok(found) => Ok(found),
            Err(e) => match e.kind() {
                ErrorKind::Network => Err(network_error(&e)),
                ErrorKind::Provider => {
                    log::warn!(
                        "Provider {} returned a malformed {} response: {e}",
                        self.provider.id(),
                        strategy.as_str()
                    );
                    Ok(None)
                }
            },
        }
    }
}

fn network_error(e: &GeocodeError) -> ResolveError {
    log::warn!("Geocode request failed: {e}");
    ResolveError::Network {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use address_engine_models::SuggestionOption;
    use async_trait::async_trait;

    use super::*;

    /// Scripted answers per strategy, plus a call log.
    struct ScriptedProvider {
        structured: fn() -> Result<Option<GeocodeMatch>, GeocodeError>,
        loose: fn() -> Result<Option<GeocodeMatch>, GeocodeError>,
        calls: Mutex<Vec<(QueryStrategy, String)>>,
    }

    impl ScriptedProvider {
        fn new(
            structured: fn() -> Result<Option<GeocodeMatch>, GeocodeError>,
            loose: fn() -> Result<Option<GeocodeMatch>, GeocodeError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                structured,
                loose,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn count(&self, strategy: QueryStrategy) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == strategy)
                .count()
        }
    }

    #[async_trait]
    impl GeocodingProvider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn suggest(
            &self,
            _text: &str,
            _limit: usize,
        ) -> Result<Vec<SuggestionOption>, GeocodeError> {
            Ok(Vec::new())
        }

        async fn geocode(
            &self,
            text: &str,
            strategy: QueryStrategy,
        ) -> Result<Option<GeocodeMatch>, GeocodeError> {
            self.calls.lock().unwrap().push((strategy, text.to_string()));
            match strategy {
                QueryStrategy::Structured => (self.structured)(),
                QueryStrategy::Loose => (self.loose)(),
            }
        }
    }

    #[allow(clippy::unnecessary_wraps)]
    fn empty() -> Result<Option<GeocodeMatch>, GeocodeError> {
        Ok(None)
    }

    #[allow(clippy::unnecessary_wraps)]
    fn found() -> Result<Option<GeocodeMatch>, GeocodeError> {
        Ok(Some(GeocodeMatch {
            coordinates: Coordinates::new(50.1, 8.6),
            label: None,
        }))
    }

    fn unavailable() -> Result<Option<GeocodeMatch>, GeocodeError> {
        Err(GeocodeError::Status { status: 503 })
    }

    fn malformed() -> Result<Option<GeocodeMatch>, GeocodeError> {
        Err(GeocodeError::Parse {
            message: "expected array".to_string(),
        })
    }

    #[tokio::test]
    async fn falls_back_to_loose_query() {
        let provider = ScriptedProvider::new(empty, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        let coordinates = resolver.resolve("Hauptstr 12ab, 99999").await.unwrap();

        assert_eq!(coordinates, Coordinates::new(50.1, 8.6));
        assert_eq!(provider.count(QueryStrategy::Structured), 1);
        assert_eq!(provider.count(QueryStrategy::Loose), 1);
    }

    #[tokio::test]
    async fn structured_match_skips_fallback() {
        let provider = ScriptedProvider::new(found, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        resolver.resolve("Pariser Platz, Berlin").await.unwrap();

        assert_eq!(provider.count(QueryStrategy::Structured), 1);
        assert_eq!(provider.count(QueryStrategy::Loose), 0);
    }

    #[tokio::test]
    async fn both_empty_is_not_found() {
        let provider = ScriptedProvider::new(empty, empty);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        let err = resolver.resolve("zzzzzz_invalid_address").await.unwrap_err();

        assert_eq!(err, ResolveError::NotFound);
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn network_error_aborts_fallback() {
        let provider = ScriptedProvider::new(unavailable, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        let err = resolver.resolve("Hauptstr 12ab, 99999").await.unwrap_err();

        assert!(matches!(err, ResolveError::Network { .. }));
        assert_eq!(provider.count(QueryStrategy::Loose), 0);
    }

    #[tokio::test]
    async fn malformed_response_falls_through() {
        let provider = ScriptedProvider::new(malformed, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        let coordinates = resolver.resolve("Hauptstr 12ab, 99999").await.unwrap();

        assert_eq!(coordinates, Coordinates::new(50.1, 8.6));
        assert_eq!(provider.count(QueryStrategy::Loose), 1);
    }

    #[tokio::test]
    async fn short_input_is_rejected_without_calls() {
        let provider = ScriptedProvider::new(found, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        let err = resolver.resolve("  Ab  ").await.unwrap_err();

        assert_eq!(
            err,
            ResolveError::InvalidInput {
                length: 2,
                minimum: 5
            }
        );
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn queries_with_normalized_text() {
        let provider = ScriptedProvider::new(found, found);
        let resolver = GeocodeResolver::new(provider.clone(), 5);

        resolver.resolve("  Hauptstraße  5,  Köln ").await.unwrap();

        assert_eq!(
            provider.calls.lock().unwrap()[0].1,
            "Hauptstr 5, Koln".to_string()
        );
    }
}
