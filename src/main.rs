//! Scheduler entry point.
//!
//! Intended to be triggered once per interval by an external scheduler.
//! Exits non-zero only on setup errors (missing or invalid credentials);
//! a day with nothing to send is a successful run.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cycle_companion::adapters::ai::{GenerationServiceConfig, HttpTextGenerator};
use cycle_companion::adapters::push::{HttpPushSender, PushGatewayConfig};
use cycle_companion::adapters::store::{HttpDocumentStore, HttpStoreConfig};
use cycle_companion::application::{NotificationDispatcher, PersonaTextGenerator};
use cycle_companion::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = config.validate() {
        error!(%error, "invalid configuration");
        return ExitCode::FAILURE;
    }

    let store = Arc::new(HttpDocumentStore::new(
        HttpStoreConfig::new(
            config.store.base_url.clone(),
            config.store.api_token.expose_secret().clone(),
        )
        .with_timeout(config.store.timeout()),
    ));

    let generator = PersonaTextGenerator::new(Arc::new(HttpTextGenerator::new(
        GenerationServiceConfig::new(config.ai.api_key.expose_secret().clone())
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    )));

    let push = Arc::new(HttpPushSender::new(
        PushGatewayConfig::new(
            config.push.gateway_url.clone(),
            config.push.api_token.expose_secret().clone(),
        )
        .with_timeout(config.push.timeout()),
    ));

    let dispatcher = NotificationDispatcher::new(store, push, generator);

    match dispatcher.run(Utc::now()).await {
        Ok(report) => {
            info!(
                notification_type = report.notification_type.map(|t| t.as_str()),
                attempted = report.attempted,
                delivered = report.delivered,
                deduplicated = report.deduplicated,
                "scheduler run finished"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            // Runtime failures are logged but do not fail the invocation;
            // the next scheduled run re-derives the same decision and the
            // ledger guards against duplicates.
            error!(%error, "scheduler run failed");
            ExitCode::SUCCESS
        }
    }
}
