//! Interactive session driven by `dialoguer` prompts.
//!
//! The type-ahead session runs a real [`AddressEngine`]: every line typed
//! is fed in as an input change, the session waits for the debounced
//! search to settle, and the user may pick one of the offered options.

use std::time::Duration;

use address_engine::normalize::normalize;
use address_engine::{AddressEngine, EngineConfig, EngineHost, ResolvedAddress, SearchError};
use address_engine_geocoder::service_registry::enabled_services;
use dialoguer::{Input, Select};

use crate::provider_from_config;

/// Upper bound on how long the session waits for one search.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

enum Action {
    TypeAhead,
    Resolve,
    Normalize,
    ListServices,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::TypeAhead,
        Self::Resolve,
        Self::Normalize,
        Self::ListServices,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::TypeAhead => "Search addresses as you type",
            Self::Resolve => "Resolve an address to coordinates",
            Self::Normalize => "Normalize address text",
            Self::ListServices => "List enabled geocoding services",
            Self::Quit => "Quit",
        }
    }
}

/// Prints engine callbacks to the terminal.
struct TerminalHost;

impl EngineHost for TerminalHost {
    fn display_text_changed(&mut self, text: &str) {
        println!("Input set to: {text}");
    }

    fn address_resolved(&mut self, address: ResolvedAddress) {
        println!("Selected: {} ({})", address.label, address.coordinates);
    }

    fn search_failed(&mut self, error: &SearchError) {
        println!("Search failed: {error}");
    }
}

/// Runs the interactive menu loop until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or the configured provider cannot
/// be built.
pub async fn run(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Address Engine ({})", config.provider);
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::TypeAhead => type_ahead(config).await?,
            Action::Resolve => resolve(config).await?,
            Action::Normalize => {
                let text: String = Input::new().with_prompt("Text").interact_text()?;
                println!("{}", normalize(&text));
            }
            Action::ListServices => {
                for service in enabled_services() {
                    println!("{:<12} {} (priority {})", service.id, service.name, service.priority);
                }
            }
            Action::Quit => return Ok(()),
        }

        println!();
    }
}

async fn type_ahead(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = AddressEngine::spawn(config, provider_from_config(config)?, TerminalHost);
    let mut updates = engine.subscribe();

    println!("Type an address; an empty line ends the session.");

    loop {
        let text: String = Input::new()
            .with_prompt("Address")
            .allow_empty(true)
            .interact_text()?;
        if text.trim().is_empty() {
            break;
        }

        engine.on_input_change(text);
        // Past the quiet period the search has either been issued or skipped.
        tokio::time::sleep(config.quiet_period() + Duration::from_millis(50)).await;

        let state = match tokio::time::timeout(
            SEARCH_TIMEOUT,
            updates.wait_for(|s| !s.is_loading),
        )
        .await
        {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => break,
            Err(_) => {
                println!("Search timed out");
                continue;
            }
        };

        if state.options.is_empty() {
            println!("No suggestions for {:?}", state.normalized_input);
            continue;
        }

        let mut items: Vec<&str> = state.options.iter().map(|o| o.label.as_str()).collect();
        items.push("(keep typing)");

        let choice = Select::new()
            .with_prompt("Suggestions")
            .items(&items)
            .default(0)
            .interact()?;

        if let Some(option) = state.options.get(choice) {
            engine.on_suggestion_pick(option.id.clone());
            engine.shutdown().await;
            return Ok(());
        }
    }

    engine.shutdown().await;
    Ok(())
}

async fn resolve(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = AddressEngine::spawn(config, provider_from_config(config)?, TerminalHost);

    let text: String = Input::new().with_prompt("Address").interact_text()?;

    match engine.on_submit_resolve(&text).await {
        Ok(address) => println!("{}: {}", address.label, address.coordinates),
        Err(e) => println!("Could not resolve {text:?}: {e}"),
    }

    engine.shutdown().await;
    Ok(())
}
