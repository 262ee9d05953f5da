//! Stale-response guard.
//!
//! Every settled input becomes a [`Query`] tagged with the next
//! [`Sequence`]. Responses may complete in any order; [`ResponseGuard::apply`]
//! only lets through the response to the latest issued query. Anything
//! older is discarded, even if it completes while the latest is still in
//! flight, so options the user has already typed past never become visible.

use address_engine_models::{Query, SearchState, Sequence, SuggestionOption};

use crate::SearchError;

/// Result of handing a completed response to the guard.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// The response answered the latest query and replaced the options.
    Applied {
        /// Number of options now visible.
        options: usize,
    },
    /// The query failed; options were cleared and the error should be
    /// reported once.
    Failed(SearchError),
    /// The response was superseded and has been discarded.
    Stale,
}

/// Owns the visible [`SearchState`] and the sequence counter.
#[derive(Debug, Default)]
pub struct ResponseGuard {
    state: SearchState,
    highest_issued: Sequence,
}

impl ResponseGuard {
    /// Creates a guard with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The visible search state.
    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    /// Allocates the next sequence for `text` and marks the state loading.
    pub fn issue(&mut self, text: impl Into<String>) -> Query {
        self.highest_issued = self.highest_issued.next();
        self.refresh_loading();

        Query {
            sequence: self.highest_issued,
            text: text.into(),
        }
    }

    /// Applies a completed response if it answers the latest issued query.
    ///
    /// Stale responses leave options and the loading flag untouched.
    pub fn apply(
        &mut self,
        sequence: Sequence,
        result: Result<Vec<SuggestionOption>, SearchError>,
    ) -> GuardOutcome {
        if sequence != self.highest_issued || sequence <= self.state.last_applied_sequence {
            log::debug!(
                "Dropping stale response {sequence} (latest issued {}, last applied {})",
                self.highest_issued,
                self.state.last_applied_sequence
            );
            return GuardOutcome::Stale;
        }

        self.state.last_applied_sequence = sequence;
        self.refresh_loading();

        match result {
            Ok(options) => {
                log::debug!("Applying response {sequence}: {} option(s)", options.len());
                let count = options.len();
                self.state.options = options;
                GuardOutcome::Applied { options: count }
            }
            Err(e) => {
                self.state.options.clear();
                GuardOutcome::Failed(e)
            }
        }
    }

    /// Marks every in-flight query as dropped.
    ///
    /// Responses for queries issued before this call will be [`GuardOutcome::Stale`].
    /// Visible options are left untouched.
    pub fn supersede(&mut self) {
        if self.highest_issued > self.state.last_applied_sequence {
            log::debug!(
                "Superseding in-flight queries up to {}",
                self.highest_issued
            );
        }
        self.state.last_applied_sequence = self.highest_issued;
        self.refresh_loading();
    }

    /// Removes all visible options.
    pub fn clear_options(&mut self) {
        self.state.options.clear();
    }

    /// Records the latest raw input and its normalized form.
    pub fn set_input(&mut self, raw: impl Into<String>, normalized: impl Into<String>) {
        self.state.raw_input = raw.into();
        self.state.normalized_input = normalized.into();
    }

    /// Records whether the suggestion surface is shown.
    pub const fn set_open(&mut self, open: bool) {
        self.state.is_open = open;
    }

    /// Clears input, options and the surface flag, superseding in-flight
    /// queries. The sequence counter is never rewound.
    pub fn reset(&mut self) {
        self.supersede();
        self.state = SearchState {
            last_applied_sequence: self.state.last_applied_sequence,
            ..SearchState::default()
        };
    }

    fn refresh_loading(&mut self) {
        self.state.is_loading = self.highest_issued > self.state.last_applied_sequence;
    }
}
