#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the address resolution engine.
//!
//! This crate contains only data types and trivial conversions. It has no
//! heavyweight dependencies (no HTTP client, no async runtime), so both the
//! provider layer and UI-facing callers can depend on it cheaply.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Monotonic sequence number tagging each issued search query.
///
/// Issued in strictly increasing order per engine instance and never
/// reused. [`Sequence::ZERO`] means "nothing applied yet".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Sequence(pub u64);

impl Sequence {
    /// The sequence that precedes every issued query.
    pub const ZERO: Self = Self(0);

    /// Returns the sequence immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A search query issued for one settled input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Position of this query in the engine's total order.
    pub sequence: Sequence,
    /// Normalized query text.
    pub text: String,
}

/// A candidate address offered to the user while typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOption {
    /// Provider-assigned identifier, stable within one provider response.
    pub id: String,
    /// Display label derived from the structured address fields.
    pub label: String,
    /// Location of the candidate.
    pub coordinates: Coordinates,
}

/// The engine's output artifact: an address label with its coordinates.
///
/// Ownership transfers to the caller, which may persist it as part of a
/// larger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    /// Address text as shown to the user.
    pub label: String,
    /// Resolved location.
    pub coordinates: Coordinates,
}

impl From<SuggestionOption> for ResolvedAddress {
    fn from(option: SuggestionOption) -> Self {
        Self {
            label: option.label,
            coordinates: option.coordinates,
        }
    }
}

/// Visible state of the type-ahead search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Text exactly as the user typed it (or as set by a commit).
    pub raw_input: String,
    /// Normalized form of [`Self::raw_input`].
    pub normalized_input: String,
    /// Whether the most recently issued query is still outstanding.
    pub is_loading: bool,
    /// Options from the latest applied response, in provider order.
    pub options: Vec<SuggestionOption>,
    /// Highest sequence whose outcome has been applied or superseded.
    pub last_applied_sequence: Sequence,
    /// Whether the suggestion surface is currently shown.
    pub is_open: bool,
}

impl SearchState {
    /// Looks up a visible option by its provider id.
    #[must_use]
    pub fn option(&self, id: &str) -> Option<&SuggestionOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_orders_numerically() {
        let first = Sequence::ZERO.next();
        let second = first.next();
        assert!(second > first);
        assert!(first > Sequence::ZERO);
        assert_eq!(second.to_string(), "#2");
    }

    #[test]
    fn resolved_address_from_option_keeps_label_and_coordinates() {
        let option = SuggestionOption {
            id: "1".to_string(),
            label: "Pariser Platz, Berlin".to_string(),
            coordinates: Coordinates::new(52.5163, 13.3777),
        };
        let resolved = ResolvedAddress::from(option);
        assert_eq!(resolved.label, "Pariser Platz, Berlin");
        assert_eq!(resolved.coordinates, Coordinates::new(52.5163, 13.3777));
    }

    #[test]
    fn finds_option_by_id() {
        let state = SearchState {
            options: vec![SuggestionOption {
                id: "42".to_string(),
                label: "Hauptstr 1".to_string(),
                coordinates: Coordinates::new(1.0, 2.0),
            }],
            ..SearchState::default()
        };
        assert_eq!(state.option("42").map(|o| o.label.as_str()), Some("Hauptstr 1"));
        assert!(state.option("7").is_none());
    }

    #[test]
    fn state_serializes_to_json() {
        let state = SearchState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["last_applied_sequence"], 0);
        assert_eq!(json["is_open"], false);
    }
}
