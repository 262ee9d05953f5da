#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding providers for the address resolution engine.
//!
//! Every provider implements [`GeocodingProvider`], which offers two
//! operations:
//!
//! 1. **Suggestions**: a free-text search returning several candidate
//!    addresses for type-ahead display.
//! 2. **Geocoding**: a single best match for a complete address, either
//!    as a structured query (street, postal code and locality sent as
//!    separate fields) or as a loose free-text query.
//!
//! Two HTTP implementations are available, both configured via TOML files
//! in `services/` (see [`service_registry`]):
//!
//! - **Nominatim / OpenStreetMap**: free, no API key, strict fair-use
//!   policy (requires a descriptive `User-Agent`).
//! - **Mapbox Places**: requires an access token, passed explicitly by
//!   the caller.

pub mod address;
pub mod label;
pub mod mapbox;
pub mod nominatim;
pub mod service_registry;

use address_engine_models::{Coordinates, SuggestionOption};
use thiserror::Error;

/// How strictly a geocoding query interprets the address text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStrategy {
    /// Address fields are separated and sent as a structured query.
    Structured,
    /// The whole text is sent as a generic free-text term.
    Loose,
}

impl QueryStrategy {
    /// Short name used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Loose => "loose",
        }
    }
}

/// A single geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    /// Location of the match.
    pub coordinates: Coordinates,
    /// The provider's canonical label for the match, if any.
    pub label: Option<String>,
}

/// Coarse classification of a [`GeocodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request did not complete or the provider answered with a
    /// non-success status.
    Network,
    /// The provider answered successfully but the body had an unexpected
    /// shape.
    Provider,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status code.
    #[error("Provider returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// A configured base URL is not an absolute URL that can carry a path.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The configured URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

impl GeocodeError {
    /// Classifies this error as a transport or a response-shape failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Status { .. } | Self::RateLimited | Self::InvalidBaseUrl { .. } => {
                ErrorKind::Network
            }
            Self::Parse { .. } => ErrorKind::Provider,
        }
    }
}

/// Parses `raw` as a base URL that request paths can be appended to.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidBaseUrl`] if `raw` is not an absolute
/// URL or cannot carry path segments (e.g., `mailto:`).
pub fn parse_base_url(raw: &str) -> Result<reqwest::Url, GeocodeError> {
    let invalid = |message: String| GeocodeError::InvalidBaseUrl {
        url: raw.to_string(),
        message,
    };

    let url = reqwest::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("cannot carry a path".to_string()));
    }
    Ok(url)
}

/// A remote geocoding service.
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Short identifier used in logs (e.g., `"nominatim"`).
    fn id(&self) -> &str;

    /// Searches for up to `limit` candidate addresses matching `text`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request fails or the response
    /// cannot be parsed.
    async fn suggest(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionOption>, GeocodeError>;

    /// Resolves `text` to at most one best match.
    ///
    /// Returns `Ok(None)` for a well-formed response with zero matches.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request fails or the response
    /// cannot be parsed.
    async fn geocode(
        &self,
        text: &str,
        strategy: QueryStrategy,
    ) -> Result<Option<GeocodeMatch>, GeocodeError>;
}

/// Reads a response body as JSON, mapping status and decode failures.
///
/// The body is read as text first so that a malformed body is reported as
/// [`GeocodeError::Parse`] rather than as a transport error.
pub(crate) async fn read_json(
    resp: reqwest::Response,
) -> Result<serde_json::Value, GeocodeError> {
    let status = resp.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !status.is_success() {
        return Err(GeocodeError::Status {
            status: status.as_u16(),
        });
    }

    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
        message: format!("invalid JSON body: {e}"),
    })
}

/// Parses a coordinate that may be encoded as a JSON number or string.
pub(crate) fn parse_coordinate(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|v| v.is_finite())
}
