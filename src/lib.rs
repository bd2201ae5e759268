pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::{CacheStore, Store};
use crate::core::config::AppConfig;
use crate::core::identity::StaticIdentity;
use crate::providers::caching::{
    HISTORY_COLLECTION, HistoricalRatesCache, LATEST_COLLECTION, LatestRatesCache,
};
use crate::providers::frankfurter::FrankfurterProvider;
use crate::providers::open_er::OpenErProvider;
use crate::providers::util::build_client;
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need configuration and services.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Currencies,
    Rates {
        base: Option<String>,
        refresh: bool,
    },
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
        edit_target: bool,
        refresh: bool,
    },
    History {
        base: String,
        target: String,
        years: u32,
        refresh: bool,
    },
    ClearCache,
}

/// Long lived collaborators, built once per process.
pub struct Services {
    pub config: AppConfig,
    pub store: Arc<KeyValueStore>,
    pub latest: Arc<LatestRatesCache>,
    pub history: Arc<HistoricalRatesCache>,
}

pub fn build_services(config: AppConfig) -> Result<Services> {
    let data_path = config.default_data_path()?;
    let store = Arc::new(KeyValueStore::open(&data_path));
    debug!(
        persistent = store.is_persistent(),
        "Opened cache store under {}",
        data_path.display()
    );

    let client = build_client(config.http_timeout()).context("Failed to build HTTP client")?;
    let latest_source = Arc::new(OpenErProvider::new(
        &config.providers.exchange_rate.base_url,
        client.clone(),
    ));
    let series_source = Arc::new(FrankfurterProvider::new(
        &config.providers.frankfurter.base_url,
        client,
    ));
    let identity = Arc::new(StaticIdentity::new(config.user_id.clone()));

    let ttl = config.cache_ttl();
    let latest = Arc::new(LatestRatesCache::new(
        CacheStore::new(store.get_collection(LATEST_COLLECTION)?),
        ttl,
        latest_source,
    ));
    let history = Arc::new(HistoricalRatesCache::new(
        CacheStore::new(store.get_collection(HISTORY_COLLECTION)?),
        ttl,
        series_source,
        identity,
    ));

    Ok(Services {
        config,
        store,
        latest,
        history,
    })
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("devise starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let services = build_services(config)?;

    match command {
        AppCommand::Currencies => cli::currencies::run(),
        AppCommand::Rates { base, refresh } => {
            cli::rates::run(&services, base.as_deref(), refresh).await?;
            Ok(())
        }
        AppCommand::Convert {
            amount,
            from,
            to,
            edit_target,
            refresh,
        } => {
            let request = cli::convert::ConvertArgs {
                amount: &amount,
                from: from.as_deref(),
                to: to.as_deref(),
                edit_target,
                refresh,
            };
            cli::convert::run(&services, request).await?;
            Ok(())
        }
        AppCommand::History {
            base,
            target,
            years,
            refresh,
        } => {
            cli::history::run(&services, &base, &target, years, refresh).await?;
            Ok(())
        }
        AppCommand::ClearCache => cli::cache::clear(&services).await,
    }
}
