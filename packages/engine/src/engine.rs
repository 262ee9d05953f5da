//! The address engine actor.
//!
//! [`AddressEngine::spawn`] starts one tokio task that owns the search
//! state, the debouncer and the selection committer. Caller commands,
//! fetch completions and debounce deadlines are multiplexed in a single
//! `select!` loop, so every state transition runs to completion before the
//! next event is looked at. Provider calls for suggestions run in spawned
//! tasks and report back through a channel; their completion order does
//! not matter because the [`ResponseGuard`] orders them by sequence.

use std::sync::Arc;

use address_engine_geocoder::GeocodingProvider;
use address_engine_models::{ResolvedAddress, SearchState, Sequence, SuggestionOption};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::fetcher::SuggestionFetcher;
use crate::guard::{GuardOutcome, ResponseGuard};
use crate::normalize::{normalize, normalized_len};
use crate::resolver::GeocodeResolver;
use crate::selection::{CloseRequest, CommitEffects, PickOutcome, SelectionCommitter};
use crate::{ResolveError, SearchError};

/// Callbacks from the engine into the embedding UI.
///
/// All methods are called from the engine task, one at a time.
pub trait EngineHost: Send + 'static {
    /// The input text was replaced by a committed selection.
    fn display_text_changed(&mut self, text: &str);

    /// A selection was committed. Called exactly once per commit.
    fn address_resolved(&mut self, address: ResolvedAddress);

    /// The engine wants the suggestion surface closed.
    ///
    /// Return [`CloseRequest::Deferred`] if closing is asynchronous, then
    /// call [`AddressEngine::close_honored`] once it has happened.
    fn close_requested(&mut self) -> CloseRequest {
        CloseRequest::Honored
    }

    /// A search failed. Called once per failed query that was not stale.
    fn search_failed(&mut self, error: &SearchError) {
        log::warn!("Address search failed: {error}");
    }

    /// The visible search state changed.
    fn state_changed(&mut self, _state: &SearchState) {}
}

#[derive(Debug)]
enum Command {
    InputChanged(String),
    Pick(String),
    Open,
    CloseHonored,
    Reset,
}

struct Completion {
    sequence: Sequence,
    result: Result<Vec<SuggestionOption>, SearchError>,
}

enum Event {
    Command(Command),
    Completed(Completion),
    Settled(String),
}

/// Handle to a running address engine.
///
/// Commands are queued and processed in order by the engine task. Dropping
/// the handle (or calling [`Self::shutdown`]) stops the task once queued
/// commands are processed.
pub struct AddressEngine {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
    resolver: GeocodeResolver,
    task: JoinHandle<()>,
}

impl AddressEngine {
    /// Starts an engine on the current tokio runtime.
    ///
    /// `config` is expected to be validated (see [`EngineConfig::validate`]).
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<H: EngineHost>(
        config: &EngineConfig,
        provider: Arc<dyn GeocodingProvider>,
        host: H,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::default());

        let debouncer = Debouncer::new(config.quiet_period());

        log::debug!(
            "Starting address engine: provider={} quiet_period={:?} min_search_chars={}",
            provider.id(),
            debouncer.quiet_period(),
            config.min_search_chars
        );

        let actor = Actor {
            min_search_chars: config.min_search_chars,
            guard: ResponseGuard::new(),
            debouncer,
            committer: SelectionCommitter::new(),
            fetcher: SuggestionFetcher::new(provider.clone(), config.suggestion_limit),
            completions: completions_tx,
            state: state_tx,
            host,
        };

        let task = tokio::spawn(actor.run(commands_rx, completions_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            resolver: GeocodeResolver::new(provider, config.min_resolve_chars),
            task,
        }
    }

    /// Reports a change of the input text.
    pub fn on_input_change(&self, text: impl Into<String>) {
        self.send(Command::InputChanged(text.into()));
    }

    /// Reports that the user picked the visible option with `option_id`.
    pub fn on_suggestion_pick(&self, option_id: impl Into<String>) {
        self.send(Command::Pick(option_id.into()));
    }

    /// Reports that the suggestion surface was opened.
    pub fn open_suggestions(&self) {
        self.send(Command::Open);
    }

    /// Reports that a deferred close has completed.
    pub fn close_honored(&self) {
        self.send(Command::CloseHonored);
    }

    /// Clears input, options and any selection in progress.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    /// Resolves submitted address text to coordinates.
    ///
    /// Runs independently of the type-ahead session. The returned label is
    /// the submitted text, trimmed with whitespace runs collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the text is too short, no match exists,
    /// or a provider request fails.
    pub async fn on_submit_resolve(&self, raw: &str) -> Result<ResolvedAddress, ResolveError> {
        let coordinates = self.resolver.resolve(raw).await?;

        Ok(ResolvedAddress {
            label: raw.split_whitespace().collect::<Vec<_>>().join(" "),
            coordinates,
        })
    }

    /// Subscribes to search state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Snapshot of the current search state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Stops the engine after queued commands are processed.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(e) = self.task.await {
            log::error!("Address engine task failed: {e}");
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            log::warn!("Address engine stopped; dropping {:?}", e.0);
        }
    }
}

struct Actor<H> {
    min_search_chars: usize,
    guard: ResponseGuard,
    debouncer: Debouncer<String>,
    committer: SelectionCommitter,
    fetcher: SuggestionFetcher,
    completions: mpsc::UnboundedSender<Completion>,
    state: watch::Sender<SearchState>,
    host: H,
}

impl<H: EngineHost> Actor<H> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            let event = tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => break,
                },
                Some(completion) = completions.recv() => Event::Completed(completion),
                text = self.debouncer.settled() => Event::Settled(text),
            };

            match event {
                Event::Command(Command::InputChanged(text)) => self.input_changed(text),
                Event::Command(Command::Pick(id)) => self.pick(&id),
                Event::Command(Command::Open) => self.guard.set_open(true),
                Event::Command(Command::CloseHonored) => self.close_honored(),
                Event::Command(Command::Reset) => self.reset(),
                Event::Completed(completion) => self.completed(completion),
                Event::Settled(text) => self.search(text),
            }

            self.publish();
        }

        log::debug!("Address engine stopped");
    }

    fn input_changed(&mut self, raw: String) {
        let length = normalized_len(&raw);
        let normalized = normalize(&raw);
        self.guard.set_input(raw, normalized.clone());

        if length < self.min_search_chars {
            log::trace!("Input below {} chars; clearing", self.min_search_chars);
            self.debouncer.cancel();
            self.guard.supersede();
            self.guard.clear_options();
            self.guard.set_open(false);
            return;
        }

        self.debouncer.push(normalized);
    }

    fn search(&mut self, text: String) {
        let query = self.guard.issue(text);
        let fetcher = self.fetcher.clone();
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let result = fetcher.search(&query).await;
            let completion = Completion {
                sequence: query.sequence,
                result,
            };
            if completions.send(completion).is_err() {
                log::debug!("Engine stopped before {} completed", query.sequence);
            }
        });
    }

    fn completed(&mut self, completion: Completion) {
        match self.guard.apply(completion.sequence, completion.result) {
            GuardOutcome::Applied { options } => {
                if self.committer.is_idle() {
                    self.guard.set_open(options > 0);
                }
            }
            GuardOutcome::Failed(e) => {
                self.guard.set_open(false);
                self.host.search_failed(&e);
            }
            GuardOutcome::Stale => {}
        }
    }

    fn pick(&mut self, id: &str) {
        if !self.guard.state().is_open {
            log::debug!("Ignoring pick of {id:?}: suggestions are closed");
            return;
        }

        let Some(option) = self.guard.state().option(id).cloned() else {
            log::debug!("Ignoring pick of unknown option {id:?}");
            return;
        };

        let mut sink = CommitSink {
            host: &mut self.host,
            guard: &mut self.guard,
            debouncer: &mut self.debouncer,
        };

        match self.committer.pick(option, &mut sink) {
            PickOutcome::Committed => log::debug!("Selection committed"),
            PickOutcome::AwaitingClose => log::debug!("Selection delivered; awaiting close"),
            PickOutcome::Ignored => {}
        }
    }

    fn close_honored(&mut self) {
        if self.committer.close_honored() {
            log::debug!("Deferred close completed");
        }
        self.guard.set_open(false);
    }

    fn reset(&mut self) {
        log::debug!("Resetting address engine");
        self.debouncer.cancel();
        self.guard.reset();
        self.committer.reset();
    }

    fn publish(&mut self) {
        let state = self.guard.state();
        let changed = self.state.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });

        if changed {
            self.host.state_changed(state);
        }
    }
}

/// Routes commit effects to the host and the engine's own state.
struct CommitSink<'a, H> {
    host: &'a mut H,
    guard: &'a mut ResponseGuard,
    debouncer: &'a mut Debouncer<String>,
}

impl<H: EngineHost> CommitEffects for CommitSink<'_, H> {
    fn set_display_text(&mut self, text: &str) {
        // The committed label must not trigger a new search.
        self.debouncer.cancel();
        self.guard.supersede();
        self.guard.set_input(text, normalize(text));
        self.host.display_text_changed(text);
    }

    fn deliver(&mut self, address: ResolvedAddress) {
        self.host.address_resolved(address);
    }

    fn request_close(&mut self) -> CloseRequest {
        let request = self.host.close_requested();
        if request == CloseRequest::Honored {
            self.guard.set_open(false);
        }
        request
    }
}
