//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance has a strict fair-use policy: requests must carry
//! a descriptive `User-Agent`, and bulk or per-keystroke traffic is not
//! allowed. Debouncing is the caller's responsibility.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use address_engine_models::{Coordinates, SuggestionOption};

use crate::address::split_address;
use crate::label::{AddressDetails, derive_label};
use crate::{
    GeocodeError, GeocodeMatch, GeocodingProvider, QueryStrategy, parse_coordinate, read_json,
};

/// Locality keys in Nominatim's `address` object, most specific first.
const LOCALITY_KEYS: &[&str] = &["city", "town", "village", "hamlet", "municipality", "suburb"];

/// Street keys in Nominatim's `address` object.
const STREET_KEYS: &[&str] = &["road", "pedestrian", "footway", "square"];

/// Connection settings for a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// Preferred language for labels (`accept-language`).
    pub language: String,
    /// Comma-separated ISO country codes to restrict results to. Empty
    /// means unrestricted.
    pub country_codes: String,
    /// `User-Agent` identifying the application.
    pub user_agent: String,
}

/// Client for the Nominatim search endpoint.
pub struct NominatimClient {
    config: NominatimConfig,
    client: reqwest::Client,
}

impl NominatimClient {
    /// Creates a client for the given instance.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    fn common_params(&self, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", limit.to_string()),
            ("accept-language", self.config.language.clone()),
        ];
        if !self.config.country_codes.is_empty() {
            params.push(("countrycodes", self.config.country_codes.clone()));
        }
        params
    }
}

#[async_trait::async_trait]
impl GeocodingProvider for NominatimClient {
    fn id(&self) -> &str {
        "nominatim"
    }

    async fn suggest(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionOption>, GeocodeError> {
        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&self.common_params(limit))
            .query(&[("q", text)])
            .send()
            .await?;

        let body = read_json(resp).await?;
        parse_suggestions(&body)
    }

    async fn geocode(
        &self,
        text: &str,
        strategy: QueryStrategy,
    ) -> Result<Option<GeocodeMatch>, GeocodeError> {
        let mut req = self
            .client
            .get(&self.config.base_url)
            .query(&self.common_params(1));

        let structured = split_address(text);
        req = match strategy {
            QueryStrategy::Structured if !structured.is_empty() => {
                req.query(&structured.query_params("street", "postalcode", "city"))
            }
            QueryStrategy::Structured | QueryStrategy::Loose => req.query(&[("q", text)]),
        };

        let resp = req.send().await?;
        let body = read_json(resp).await?;
        parse_single(&body)
    }
}

fn results_array(body: &serde_json::Value) -> Result<&Vec<serde_json::Value>, GeocodeError> {
    body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })
}

fn first_str(address: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| address.get(*k).and_then(serde_json::Value::as_str))
        .map(String::from)
}

fn address_details(place: &serde_json::Value) -> AddressDetails {
    let address = &place["address"];
    AddressDetails {
        street: first_str(address, STREET_KEYS),
        house_number: first_str(address, &["house_number"]),
        postal_code: first_str(address, &["postcode"]),
        locality: first_str(address, LOCALITY_KEYS),
    }
}

fn place_id(place: &serde_json::Value) -> Option<String> {
    match &place["place_id"] {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn place_coordinates(place: &serde_json::Value) -> Option<Coordinates> {
    let lat = parse_coordinate(&place["lat"])?;
    let lng = parse_coordinate(&place["lon"])?;
    Some(Coordinates::new(lat, lng))
}

/// Parses a suggestion response, skipping entries without usable
/// coordinates, id or label.
fn parse_suggestions(body: &serde_json::Value) -> Result<Vec<SuggestionOption>, GeocodeError> {
    let results = results_array(body)?;

    let mut options = Vec::with_capacity(results.len());
    for place in results {
        let (Some(id), Some(coordinates)) = (place_id(place), place_coordinates(place)) else {
            log::warn!("Skipping Nominatim result without id or coordinates: {place}");
            continue;
        };

        let display_name = place["display_name"].as_str();
        let Some(label) = derive_label(&address_details(place), display_name) else {
            log::debug!("Skipping Nominatim result {id} with empty label");
            continue;
        };

        options.push(SuggestionOption {
            id,
            label,
            coordinates,
        });
    }

    Ok(options)
}

/// Parses a single-match response.
fn parse_single(body: &serde_json::Value) -> Result<Option<GeocodeMatch>, GeocodeError> {
    let results = results_array(body)?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let coordinates = place_coordinates(first).ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat/lon in Nominatim response".to_string(),
    })?;

    Ok(Some(GeocodeMatch {
        coordinates,
        label: first["display_name"].as_str().map(String::from),
    }))
}
