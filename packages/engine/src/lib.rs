#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address resolution engine.
//!
//! Turns partial address text into candidate addresses while the user
//! types, and a final address into coordinates when a form is submitted:
//!
//! 1. **Normalization** ([`normalize`]): diacritic folding, street-suffix
//!    abbreviation and whitespace collapse.
//! 2. **Debouncing** ([`debounce`]): only input that has been stable for
//!    a quiet period is searched.
//! 3. **Suggestion fetching** ([`fetcher`]) guarded by a monotonic sequence
//!    ([`guard`]) so that a slow, superseded response never overwrites a
//!    newer one.
//! 4. **Selection commit** ([`selection`]): a pick becomes exactly one
//!    ordered sequence of effects, even under double taps.
//! 5. **Submit-time resolution** ([`resolver`]): a structured query,
//!    falling back to a loose query on an empty result.
//!
//! [`AddressEngine`] ties these together in a single actor task.

pub mod config;
pub mod debounce;
pub mod engine;
pub mod fetcher;
pub mod guard;
pub mod normalize;
pub mod resolver;
pub mod selection;
pub mod synonyms;

pub use address_engine_models::{
    Coordinates, Query, ResolvedAddress, SearchState, Sequence, SuggestionOption,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::{AddressEngine, EngineHost};
pub use selection::{CloseRequest, PickOutcome, SelectionState};

use address_engine_geocoder::{ErrorKind, GeocodeError};
use thiserror::Error;

/// Failure of one incremental search.
///
/// Never surfaced to the caller's control flow: the engine degrades to an
/// empty suggestion list and reports the error once through
/// [`EngineHost::search_failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request did not complete or the provider refused it.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },

    /// The provider answered with an unexpected response shape.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of the failure.
        message: String,
    },
}

impl From<GeocodeError> for SearchError {
    fn from(e: GeocodeError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::Network => Self::Network { message },
            ErrorKind::Provider => Self::Provider { message },
        }
    }
}

/// Failure of submit-time resolution.
///
/// Every variant is a valid, storable outcome: callers may keep the
/// address text without coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The address is too short to be worth a query.
    #[error("Address too short: {length} characters, at least {minimum} required")]
    InvalidInput {
        /// Normalized length of the submitted address.
        length: usize,
        /// Configured minimum.
        minimum: usize,
    },

    /// Neither the structured nor the loose query found a match.
    #[error("Address not found")]
    NotFound,

    /// A query failed at the transport level.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },
}
