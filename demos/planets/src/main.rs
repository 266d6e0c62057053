//! Planets Demo - an endpoint registry over a live HTTP API
//!
//! Fetches a few planets from SWAPI through a keyed endpoint, deduplicating
//! concurrent requests for the same planet, and prints the resulting state.
//!
//! # Running the Example
//!
//! ```bash
//! SUPER_API_BASE_URL=https://swapi.dev RUST_LOG=super_api_runtime=debug \
//!     cargo run -p planets-demo
//! ```

#![allow(missing_docs)]

use futures::future::join_all;
use std::sync::Arc;
use super_api_core::{Args, RequestKey, RequestOptions};
use super_api_runtime::metrics::MetricsExporter;
use super_api_runtime::{ApiBuilder, ApiConfig, ClientConfig, ReqwestClient, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const API: &str = r#"{
    "namespace": "@@swapi",
    "default_options": {
        "get": { "headers": { "accept": "application/json" }, "timeout_ms": 10000 }
    },
    "endpoints": {
        "planets": { "url": "/api/planets/:planetId/", "key_args": ["planetId"] },
        "people": { "url": "/api/people/:personId/", "key_args": ["personId"] }
    }
}"#;

const DEFAULT_BASE_URL: &str = "https://swapi.dev";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,super_api_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut exporter = MetricsExporter::new();
    exporter.install()?;

    // 2. Transport
    let mut config = ClientConfig::from_env()?;
    if config.base_url.is_none() {
        config = config.with_base_url(DEFAULT_BASE_URL);
    }
    tracing::info!(base_url = ?config.base_url, "Using API");
    let client = Arc::new(ReqwestClient::new(config)?);

    // 3. Registry and store
    let builder = ApiBuilder::from_config(&ApiConfig::from_json(API)?);
    let store = Arc::new(Store::new(builder.reducer()?));
    store.on_action(|action| {
        tracing::info!(action = %action.type_name(), args = ?action.args, "Dispatched");
        Ok(())
    });
    let api = builder.build(client, store.clone())?;
    let planets = api.endpoint("planets")?;

    // 4. Fetch; the duplicate request for planet 1 is skipped
    let ids = [1, 2, 1, 3];
    let results = join_all(ids.iter().map(|id| {
        planets.once(
            Args::new().with("planetId", *id),
            RequestOptions::new(),
            store.as_ref(),
        )
    }))
    .await;

    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(Some(response)) => tracing::info!(id, status = response.status, "Fetched"),
            Ok(None) => tracing::info!(id, "Skipped, already fetched or fetching"),
            Err(error) => tracing::warn!(id, %error, "Failed"),
        }
    }

    // 5. Display final state
    let names = store.state(|s| {
        ids.iter()
            .filter_map(|id| {
                let slot = s.endpoint("planets")?.slot(&RequestKey::new(id.to_string()))?;
                Some(format!("{id}: {}", slot.data["name"]))
            })
            .collect::<Vec<_>>()
    });
    for name in names {
        println!("{name}");
    }

    if let Some(metrics) = exporter.render() {
        println!("\n{metrics}");
    }

    Ok(())
}
