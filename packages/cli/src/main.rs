#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the address resolution engine.
//!
//! Runs one-off normalization, suggestion and resolution queries, or an
//! interactive type-ahead session when no subcommand is given. Log output
//! is controlled with `RUST_LOG`.

mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use address_engine::fetcher::SuggestionFetcher;
use address_engine::normalize::normalize;
use address_engine::resolver::GeocodeResolver;
use address_engine::{EngineConfig, Query, Sequence};
use address_engine_geocoder::GeocodingProvider;
use address_engine_geocoder::service_registry::{
    ProviderCredentials, all_services, build_provider, find_service,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "address_engine", about = "Address search and geocoding tool")]
struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Geocoding service id, overriding the config
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized search form of an address
    Normalize {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List suggestions for partial address text
    Suggest {
        #[arg(required = true)]
        text: Vec<String>,

        /// Maximum number of suggestions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Resolve an address to coordinates
    Resolve {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List configured geocoding services
    Services,
    /// Interactive type-ahead session
    Interactive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.provider)?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Normalize { text } => {
            println!("{}", normalize(&text.join(" ")));
        }
        Commands::Suggest { text, limit } => {
            let provider = provider_from_config(&config)?;
            let fetcher =
                SuggestionFetcher::new(provider, limit.unwrap_or(config.suggestion_limit));
            let query = Query {
                sequence: Sequence::ZERO.next(),
                text: normalize(&text.join(" ")),
            };

            let options = fetcher.search(&query).await?;
            if options.is_empty() {
                println!("No suggestions for {:?}", query.text);
            }
            for option in &options {
                println!("{:<24} {:<50} {}", option.id, option.label, option.coordinates);
            }
        }
        Commands::Resolve { text } => {
            let provider = provider_from_config(&config)?;
            let resolver = GeocodeResolver::new(provider, config.min_resolve_chars);
            let coordinates = resolver.resolve(&text.join(" ")).await?;
            println!("{coordinates}");
        }
        Commands::Services => {
            println!("{:<12} {:<28} {:<8} {:<4} BASE URL", "ID", "NAME", "ENABLED", "PRIO");
            println!("{}", "-".repeat(90));
            for service in all_services() {
                println!(
                    "{:<12} {:<28} {:<8} {:<4} {}",
                    service.id,
                    service.name,
                    service.enabled,
                    service.priority,
                    service.base_url()
                );
            }
        }
        Commands::Interactive => interactive::run(&config).await?,
    }

    Ok(())
}

fn load_config(
    path: Option<&Path>,
    provider: Option<String>,
) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if let Some(provider) = provider {
        config.provider = provider;
        config.validate()?;
    }

    Ok(config)
}

/// Builds the provider named in `config`, taking credentials from the
/// environment.
fn provider_from_config(
    config: &EngineConfig,
) -> Result<Arc<dyn GeocodingProvider>, Box<dyn std::error::Error>> {
    let service = find_service(&config.provider)?;
    if !service.enabled {
        log::warn!("Geocoding service '{}' is disabled in its config", service.id);
    }

    let credentials = ProviderCredentials {
        mapbox_access_token: std::env::var("MAPBOX_ACCESS_TOKEN").ok(),
    };

    Ok(build_provider(&service, &credentials)?)
}
