//! Selection commit state machine.
//!
//! A pick moves the committer `Idle -> PendingCommit -> Committing` and runs
//! three effects in a fixed order:
//!
//! 1. the display text becomes the option's label,
//! 2. the [`ResolvedAddress`] is delivered to the caller,
//! 3. the suggestion surface is asked to close.
//!
//! A pick that arrives while the committer is not `Idle` is rejected, not
//! queued, so a double tap yields exactly one delivery. If the close request
//! is deferred, the committer stays `Committing` until
//! [`SelectionCommitter::close_honored`] is called.

use address_engine_models::{ResolvedAddress, SuggestionOption};

/// Answer to a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// The surface closed synchronously.
    Honored,
    /// The surface will close later and report back.
    Deferred,
}

/// Where a commit's side effects go.
pub trait CommitEffects {
    /// Replaces the visible input text.
    fn set_display_text(&mut self, text: &str);

    /// Hands the committed address to the caller.
    fn deliver(&mut self, address: ResolvedAddress);

    /// Asks the suggestion surface to close.
    fn request_close(&mut self) -> CloseRequest;
}

/// Commit progress for the current selection session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    /// Ready to accept a pick.
    #[default]
    Idle,
    /// A pick has been accepted; no effect has run yet.
    PendingCommit(SuggestionOption),
    /// Effects are running or the close is outstanding.
    Committing(SuggestionOption),
    /// All effects ran and the surface closed.
    Committed,
}

/// Result of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// The commit completed and the committer is idle again.
    Committed,
    /// The address was delivered; waiting for the surface to close.
    AwaitingClose,
    /// Another commit is in progress; nothing happened.
    Ignored,
}

/// Turns picks into exactly one ordered sequence of commit effects.
#[derive(Debug, Default)]
pub struct SelectionCommitter {
    state: SelectionState,
}

impl SelectionCommitter {
    /// Creates an idle committer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Whether a new pick would be accepted.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, SelectionState::Idle)
    }

    /// Commits `option` unless another commit is in progress.
    pub fn pick(
        &mut self,
        option: SuggestionOption,
        effects: &mut dyn CommitEffects,
    ) -> PickOutcome {
        if !self.is_idle() {
            log::debug!(
                "Ignoring pick of {:?} while {}",
                option.id,
                self.state_name()
            );
            return PickOutcome::Ignored;
        }

        self.state = SelectionState::PendingCommit(option.clone());
        self.state = SelectionState::Committing(option.clone());

        log::info!("Committing {:?} ({})", option.label, option.coordinates);
        effects.set_display_text(&option.label);
        effects.deliver(ResolvedAddress::from(option));

        match effects.request_close() {
            CloseRequest::Honored => {
                self.finish();
                PickOutcome::Committed
            }
            CloseRequest::Deferred => {
                log::debug!("Close deferred; holding commit");
                PickOutcome::AwaitingClose
            }
        }
    }

    /// Completes a commit whose close was deferred.
    ///
    /// Returns `false` if no commit was waiting.
    pub fn close_honored(&mut self) -> bool {
        if matches!(self.state, SelectionState::Committing(_)) {
            self.finish();
            true
        } else {
            false
        }
    }

    /// Discards the selection session.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }

    fn finish(&mut self) {
        self.state = SelectionState::Committed;
        self.state = SelectionState::Idle;
    }

    const fn state_name(&self) -> &'static str {
        match self.state {
            SelectionState::Idle => "idle",
            SelectionState::PendingCommit(_) => "pending",
            SelectionState::Committing(_) => "committing",
            SelectionState::Committed => "committed",
        }
    }
}

#[cfg(test)]
mod tests {
    use address_engine_models::Coordinates;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Effect {
        Display(String),
        Deliver(ResolvedAddress),
        Close,
    }

    struct Recorder {
        effects: Vec<Effect>,
        close: CloseRequest,
    }

    impl Recorder {
        fn new(close: CloseRequest) -> Self {
            Self {
                effects: Vec::new(),
                close,
            }
        }

        fn deliveries(&self) -> usize {
            self.effects
                .iter()
                .filter(|e| matches!(e, Effect::Deliver(_)))
                .count()
        }
    }

    impl CommitEffects for Recorder {
        fn set_display_text(&mut self, text: &str) {
            self.effects.push(Effect::Display(text.to_string()));
        }

        fn deliver(&mut self, address: ResolvedAddress) {
            self.effects.push(Effect::Deliver(address));
        }

        fn request_close(&mut self) -> CloseRequest {
            self.effects.push(Effect::Close);
            self.close
        }
    }

    fn pariser_platz() -> SuggestionOption {
        SuggestionOption {
            id: "n-1".to_string(),
            label: "Pariser Platz, 10117 Berlin".to_string(),
            coordinates: Coordinates::new(52.516_3, 13.377_7),
        }
    }

    #[test]
    fn runs_effects_in_order() {
        let mut committer = SelectionCommitter::new();
        let mut recorder = Recorder::new(CloseRequest::Honored);

        let outcome = committer.pick(pariser_platz(), &mut recorder);

        assert_eq!(outcome, PickOutcome::Committed);
        assert_eq!(
            recorder.effects,
            vec![
                Effect::Display("Pariser Platz, 10117 Berlin".to_string()),
                Effect::Deliver(ResolvedAddress::from(pariser_platz())),
                Effect::Close,
            ]
        );
        assert!(committer.is_idle());
    }

    #[test]
    fn deferred_close_blocks_second_pick() {
        let mut committer = SelectionCommitter::new();
        let mut recorder = Recorder::new(CloseRequest::Deferred);

        assert_eq!(
            committer.pick(pariser_platz(), &mut recorder),
            PickOutcome::AwaitingClose
        );
        assert!(matches!(committer.state(), SelectionState::Committing(_)));

        assert_eq!(
            committer.pick(pariser_platz(), &mut recorder),
            PickOutcome::Ignored
        );
        assert_eq!(recorder.deliveries(), 1);

        assert!(committer.close_honored());
        assert!(committer.is_idle());
        assert!(!committer.close_honored());
    }

    #[test]
    fn pick_while_busy_runs_no_effects() {
        for busy in [
            SelectionState::PendingCommit(pariser_platz()),
            SelectionState::Committing(pariser_platz()),
        ] {
            let mut committer = SelectionCommitter { state: busy.clone() };
            let mut recorder = Recorder::new(CloseRequest::Honored);

            assert_eq!(
                committer.pick(pariser_platz(), &mut recorder),
                PickOutcome::Ignored
            );
            assert!(recorder.effects.is_empty());
            assert_eq!(*committer.state(), busy);
        }
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut committer = SelectionCommitter::new();
        let mut recorder = Recorder::new(CloseRequest::Deferred);
        committer.pick(pariser_platz(), &mut recorder);

        committer.reset();

        assert_eq!(*committer.state(), SelectionState::Idle);
        assert_eq!(
            committer.pick(pariser_platz(), &mut recorder),
            PickOutcome::AwaitingClose
        );
        assert_eq!(recorder.deliveries(), 2);
    }
}
