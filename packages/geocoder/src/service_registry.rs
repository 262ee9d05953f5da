//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`] and [`enabled_services`]. [`build_provider`] turns a
//! service definition into a ready-to-use [`GeocodingProvider`].

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::mapbox::{MapboxClient, MapboxConfig};
use crate::nominatim::{NominatimClient, NominatimConfig};
use crate::{GeocodeError, GeocodingProvider, parse_base_url};

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`, `"mapbox"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be selected without an explicit request.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order; lower values are preferred.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` geocoder.
    Nominatim {
        /// Search endpoint URL.
        base_url: String,
        /// Preferred label language.
        #[serde(default = "default_language")]
        language: String,
        /// Comma-separated ISO country codes; empty for no restriction.
        #[serde(default)]
        country_codes: String,
        /// `User-Agent` sent with every request.
        user_agent: String,
    },
    /// Mapbox Places geocoder.
    Mapbox {
        /// Endpoint prefix URL.
        base_url: String,
        /// ISO country code filter; empty for no restriction.
        #[serde(default)]
        country: String,
        /// Preferred label language.
        #[serde(default = "default_language")]
        language: String,
        /// Feature types for suggestions and structured queries.
        #[serde(default = "default_mapbox_types")]
        types: String,
    },
}

/// Secrets needed by some providers, supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    /// Mapbox access token.
    pub mapbox_access_token: Option<String>,
}

/// Errors from resolving a service into a provider.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No service with the requested id exists.
    #[error("Unknown geocoding service '{id}'")]
    UnknownService {
        /// The requested id.
        id: String,
    },

    /// The service needs an access token that was not supplied.
    #[error("Geocoding service '{service}' requires an access token")]
    MissingAccessToken {
        /// The service id.
        service: String,
    },

    /// The service's base URL cannot be used for requests.
    #[error("Geocoding service '{service}' has an invalid base URL: {message}")]
    InvalidBaseUrl {
        /// The service id.
        service: String,
        /// Why the URL was rejected.
        message: String,
    },

    /// The provider client could not be constructed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

const fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "de".to_string()
}

fn default_mapbox_types() -> String {
    "address".to_string()
}

impl GeocodingService {
    /// Returns the provider's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } | ProviderConfig::Mapbox { base_url, .. } => {
                base_url
            }
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("mapbox", include_str!("../services/mapbox.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Looks up a service by id, regardless of whether it is enabled.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownService`] if no service has this id.
pub fn find_service(id: &str) -> Result<GeocodingService, RegistryError> {
    all_services()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| RegistryError::UnknownService { id: id.to_string() })
}

/// Constructs the provider client described by `service`.
///
/// # Errors
///
/// * [`RegistryError::InvalidBaseUrl`] if the service's base URL is not an
///   absolute URL that can carry a path
/// * [`RegistryError::MissingAccessToken`] if the provider needs a token
///   that `credentials` does not carry
/// * [`RegistryError::Geocode`] if the HTTP client cannot be built
pub fn build_provider(
    service: &GeocodingService,
    credentials: &ProviderCredentials,
) -> Result<Arc<dyn GeocodingProvider>, RegistryError> {
    log::debug!("Building geocoding provider '{}' ({})", service.id, service.name);

    parse_base_url(service.base_url()).map_err(|e| RegistryError::InvalidBaseUrl {
        service: service.id.clone(),
        message: e.to_string(),
    })?;

    match &service.provider {
        ProviderConfig::Nominatim {
            base_url,
            language,
            country_codes,
            user_agent,
        } => Ok(Arc::new(NominatimClient::new(NominatimConfig {
            base_url: base_url.clone(),
            language: language.clone(),
            country_codes: country_codes.clone(),
            user_agent: user_agent.clone(),
        })?)),
        ProviderConfig::Mapbox {
            base_url,
            country,
            language,
            types,
        } => {
            let access_token = credentials
                .mapbox_access_token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| RegistryError::MissingAccessToken {
                    service: service.id.clone(),
                })?;
            Ok(Arc::new(MapboxClient::new(MapboxConfig {
                base_url: base_url.clone(),
                access_token,
                country: country.clone(),
                language: language.clone(),
                types: types.clone(),
            })?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url().is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
        }
    }

    #[test]
    fn enabled_services_sorted_by_priority() {
        let services = enabled_services();
        assert!(!services.is_empty());
        for window in services.windows(2) {
            assert!(
                window[0].priority <= window[1].priority,
                "Services not sorted by priority: {} ({}) > {} ({})",
                window[0].id,
                window[0].priority,
                window[1].id,
                window[1].priority
            );
        }
    }

    #[test]
    fn nominatim_sends_user_agent() {
        let svc = find_service("nominatim").unwrap();
        match svc.provider {
            ProviderConfig::Nominatim { user_agent, .. } => assert!(!user_agent.is_empty()),
            ProviderConfig::Mapbox { .. } => panic!("nominatim service has mapbox config"),
        }
    }

    #[test]
    fn unknown_service_is_an_error() {
        assert!(matches!(
            find_service("here"),
            Err(RegistryError::UnknownService { .. })
        ));
    }

    #[test]
    fn mapbox_requires_access_token() {
        let svc = find_service("mapbox").unwrap();
        let err = build_provider(&svc, &ProviderCredentials::default()).err();
        assert!(matches!(
            err,
            Some(RegistryError::MissingAccessToken { ref service }) if service == "mapbox"
        ));

        let creds = ProviderCredentials {
            mapbox_access_token: Some("pk.test".to_string()),
        };
        let provider = build_provider(&svc, &creds).unwrap();
        assert_eq!(provider.id(), "mapbox");
    }

    #[test]
    fn builds_nominatim_without_credentials() {
        let svc = find_service("nominatim").unwrap();
        let provider = build_provider(&svc, &ProviderCredentials::default()).unwrap();
        assert_eq!(provider.id(), "nominatim");
    }

    #[test]
    fn invalid_base_url_is_a_registry_error() {
        let creds = ProviderCredentials {
            mapbox_access_token: Some("pk.test".to_string()),
        };

        for id in ["mapbox", "nominatim"] {
            let mut svc = find_service(id).unwrap();
            match &mut svc.provider {
                ProviderConfig::Nominatim { base_url, .. } | ProviderConfig::Mapbox { base_url, .. } => {
                    *base_url = "not a url".to_string();
                }
            }

            let err = build_provider(&svc, &creds).err();
            assert!(
                matches!(err, Some(RegistryError::InvalidBaseUrl { ref service, .. }) if service == id),
                "{id}: {err:?}"
            );
        }
    }
}
