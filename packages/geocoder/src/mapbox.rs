//! Mapbox Places geocoder client.
//!
//! Mapbox encodes the search text in the URL path
//! (`{base_url}/{text}.json`) and returns a `GeoJSON` `FeatureCollection`.
//! An access token is required; it is passed explicitly at construction
//! and never read from ambient state.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use address_engine_models::{Coordinates, SuggestionOption};

use crate::label::{AddressDetails, derive_label};
use crate::{
    GeocodeError, GeocodeMatch, GeocodingProvider, QueryStrategy, parse_base_url,
    parse_coordinate, read_json,
};

/// Connection settings for the Mapbox Places API.
#[derive(Debug, Clone)]
pub struct MapboxConfig {
    /// Endpoint prefix (e.g., `"https://api.mapbox.com/geocoding/v5/mapbox.places"`).
    pub base_url: String,
    /// Access token.
    pub access_token: String,
    /// ISO country code filter (e.g., `"de"`). Empty means unrestricted.
    pub country: String,
    /// Preferred language for labels.
    pub language: String,
    /// Feature types for suggestions and structured queries (e.g., `"address"`).
    pub types: String,
}

/// Client for the Mapbox Places endpoint.
pub struct MapboxClient {
    config: MapboxConfig,
    base_url: reqwest::Url,
    client: reqwest::Client,
}

impl MapboxClient {
    /// Creates a client with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidBaseUrl`] if `config.base_url` cannot
    /// have the search text appended as a path segment.
    pub fn new(config: MapboxConfig) -> Result<Self, GeocodeError> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    fn search_url(&self, text: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        // `new` only accepts URLs that can be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&format!("{text}.json"));
        }
        url
    }

    async fn search(
        &self,
        text: &str,
        limit: usize,
        types: Option<&str>,
    ) -> Result<serde_json::Value, GeocodeError> {
        let mut params = vec![
            ("access_token", self.config.access_token.clone()),
            ("language", self.config.language.clone()),
            ("limit", limit.to_string()),
        ];
        if !self.config.country.is_empty() {
            params.push(("country", self.config.country.clone()));
        }
        if let Some(types) = types.filter(|t| !t.is_empty()) {
            params.push(("types", types.to_string()));
        }

        let resp = self
            .client
            .get(self.search_url(text))
            .query(&params)
            .send()
            .await?;

        read_json(resp).await
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for MapboxClient {
    fn id(&self) -> &str {
        "mapbox"
    }

    async fn suggest(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionOption>, GeocodeError> {
        let body = self.search(text, limit, Some(self.config.types.as_str())).await?;
        parse_suggestions(&body)
    }

    async fn geocode(
        &self,
        text: &str,
        strategy: QueryStrategy,
    ) -> Result<Option<GeocodeMatch>, GeocodeError> {
        let types = match strategy {
            QueryStrategy::Structured => Some(self.config.types.as_str()),
            QueryStrategy::Loose => None,
        };
        let body = self.search(text, 1, types).await?;
        parse_single(&body)
    }
}

fn features(body: &serde_json::Value) -> Result<&Vec<serde_json::Value>, GeocodeError> {
    body.get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Mapbox response missing 'features' array".to_string(),
        })
}

/// Reads `center: [lng, lat]`.
fn feature_center(feature: &serde_json::Value) -> Option<Coordinates> {
    let center = feature.get("center")?.as_array()?;
    if center.len() < 2 {
        return None;
    }
    let lng = parse_coordinate(&center[0])?;
    let lat = parse_coordinate(&center[1])?;
    Some(Coordinates::new(lat, lng))
}

fn context_text(feature: &serde_json::Value, prefixes: &[&str]) -> Option<String> {
    let context = feature.get("context")?.as_array()?;
    prefixes.iter().find_map(|prefix| {
        context
            .iter()
            .find(|c| {
                c.get("id")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|id| id.starts_with(prefix))
            })
            .and_then(|c| c.get("text").and_then(serde_json::Value::as_str))
            .map(String::from)
    })
}

fn address_details(feature: &serde_json::Value) -> AddressDetails {
    let is_address = feature
        .get("place_type")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|types| types.iter().any(|t| t.as_str() == Some("address")));

    AddressDetails {
        street: is_address
            .then(|| feature.get("text").and_then(serde_json::Value::as_str))
            .flatten()
            .map(String::from),
        house_number: feature
            .get("address")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        postal_code: context_text(feature, &["postcode."]),
        locality: context_text(feature, &["place.", "locality."]),
    }
}

fn parse_suggestions(body: &serde_json::Value) -> Result<Vec<SuggestionOption>, GeocodeError> {
    let features = features(body)?;

    let mut options = Vec::with_capacity(features.len());
    for feature in features {
        let id = feature.get("id").and_then(serde_json::Value::as_str);
        let (Some(id), Some(coordinates)) = (id, feature_center(feature)) else {
            log::warn!("Skipping Mapbox feature without id or center: {feature}");
            continue;
        };

        let place_name = feature.get("place_name").and_then(serde_json::Value::as_str);
        let Some(label) = derive_label(&address_details(feature), place_name) else {
            log::debug!("Skipping Mapbox feature {id} with empty label");
            continue;
        };

        options.push(SuggestionOption {
            id: id.to_string(),
            label,
            coordinates,
        });
    }

    Ok(options)
}

fn parse_single(body: &serde_json::Value) -> Result<Option<GeocodeMatch>, GeocodeError> {
    let Some(first) = features(body)?.first() else {
        return Ok(None);
    };

    let coordinates = feature_center(first).ok_or_else(|| GeocodeError::Parse {
        message: "Feature missing center coordinates".to_string(),
    })?;

    Ok(Some(GeocodeMatch {
        coordinates,
        label: first
            .get("place_name")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> MapboxConfig {
        MapboxConfig {
            base_url: base_url.to_string(),
            access_token: "token".to_string(),
            country: "de".to_string(),
            language: "de".to_string(),
            types: "address".to_string(),
        }
    }

    #[test]
    fn parses_mapbox_address_feature() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "id": "address.4356035406756260",
                "place_type": ["address"],
                "text": "Hauptstraße",
                "address": "12",
                "place_name": "Hauptstraße 12, 10827 Berlin, Deutschland",
                "center": [13.3525, 52.4895],
                "context": [
                    { "id": "postcode.8754", "text": "10827" },
                    { "id": "locality.1234", "text": "Schöneberg" },
                    { "id": "place.5678", "text": "Berlin" }
                ]
            }]
        });
        let options = parse_suggestions(&body).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "address.4356035406756260");
        assert_eq!(options[0].label, "Hauptstraße 12, 10827 Berlin");
        assert!((options[0].coordinates.lat - 52.4895).abs() < 1e-4);
        assert!((options[0].coordinates.lng - 13.3525).abs() < 1e-4);
    }

    #[test]
    fn non_address_feature_uses_place_name_when_no_context() {
        let body = serde_json::json!({
            "features": [{
                "id": "poi.1",
                "place_type": ["poi"],
                "text": "Brandenburger Tor",
                "place_name": "Brandenburger Tor, Pariser Platz, Berlin",
                "center": [13.3777, 52.5163]
            }]
        });
        let options = parse_suggestions(&body).unwrap();
        assert_eq!(options[0].label, "Brandenburger Tor, Pariser Platz, Berlin");
    }

    #[test]
    fn parses_mapbox_empty() {
        let body = serde_json::json!({ "type": "FeatureCollection", "features": [] });
        assert!(parse_single(&body).unwrap().is_none());
        assert!(parse_suggestions(&body).unwrap().is_empty());
    }

    #[test]
    fn missing_features_is_parse_error() {
        let body = serde_json::json!({ "message": "Not Authorized - Invalid Token" });
        assert!(matches!(
            parse_single(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn parses_single_center() {
        let body = serde_json::json!({
            "features": [{
                "id": "address.1",
                "place_name": "Pariser Platz, 10117 Berlin, Deutschland",
                "center": [13.3777, 52.5163]
            }]
        });
        let result = parse_single(&body).unwrap().unwrap();
        assert!((result.coordinates.lat - 52.5163).abs() < 1e-4);
        assert!((result.coordinates.lng - 13.3777).abs() < 1e-4);
    }

    #[test]
    fn encodes_search_text_in_path() {
        let url = MapboxClient::new(config("https://api.mapbox.com/geocoding/v5/mapbox.places/"))
            .unwrap()
            .search_url("Hauptstr 12/3");
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/Hauptstr%2012%2F3.json"
        );
    }

    #[test]
    fn rejects_invalid_base_url_at_construction() {
        for base_url in ["not a url", "mailto:geo@example.com"] {
            assert!(
                matches!(
                    MapboxClient::new(config(base_url)),
                    Err(GeocodeError::InvalidBaseUrl { .. })
                ),
                "accepted {base_url:?}"
            );
        }
    }
}
