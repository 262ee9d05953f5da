//! Splitting free-form address text into structured fields.
//!
//! Users type addresses in many shapes:
//! - Street only: `"Hauptstr 12ab"`
//! - Street and postal code: `"Hauptstr 12ab, 99999"`
//! - Street and locality: `"Pariser Platz, Berlin"`
//! - Full form: `"Pariser Platz 1, 10117 Berlin"`
//! - Locality only: `"10117 Berlin"`
//!
//! This module separates these into the fields of a structured geocoding
//! query. Segments are comma-separated; a segment starting with a 4–5
//! digit token is the postal code (optionally followed by the locality).

use regex::Regex;
use std::sync::LazyLock;

/// Regex for a postal-code segment, optionally followed by a locality
/// (e.g., "10117", "10117 Berlin", "1010 Wien").
static POSTAL_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4,5})(?:\s+(.+))?$").expect("valid regex"));

/// An address separated into the fields of a structured query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredAddress {
    /// Street with house number.
    pub street: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// City or other locality.
    pub locality: Option<String>,
}

impl StructuredAddress {
    /// Returns `true` if no field was recognised.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.street.is_none() && self.postal_code.is_none() && self.locality.is_none()
    }

    /// Returns the query parameters for a structured search, omitting
    /// absent fields.
    #[must_use]
    pub fn query_params<'a>(
        &'a self,
        street_key: &'a str,
        postal_key: &'a str,
        locality_key: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        [
            (street_key, self.street.as_deref()),
            (postal_key, self.postal_code.as_deref()),
            (locality_key, self.locality.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

/// Splits address text into street, postal code and locality.
///
/// The first non-postal segment is the street; the next one is the
/// locality unless a postal segment already supplied it. Further segments
/// (country names, districts) are ignored.
#[must_use]
pub fn split_address(text: &str) -> StructuredAddress {
    let mut parsed = StructuredAddress::default();

    let segments = text.split(',').map(str::trim).filter(|s| !s.is_empty());

    for (idx, segment) in segments.enumerate() {
        if let Some(caps) = POSTAL_SEGMENT_RE.captures(segment) {
            if parsed.postal_code.is_none() {
                parsed.postal_code = caps.get(1).map(|m| m.as_str().to_string());
            }
            if parsed.locality.is_none() {
                parsed.locality = caps.get(2).map(|m| m.as_str().trim().to_string());
            }
            continue;
        }

        if idx == 0 {
            parsed.street = Some(segment.to_string());
        } else if parsed.locality.is_none() {
            parsed.locality = Some(segment.to_string());
        }
    }

    parsed
}
