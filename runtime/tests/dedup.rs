//! Fetch-once behavior.

#![allow(clippy::unwrap_used)] // Test code

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use super_api_core::{Args, EndpointDefinition, KeyFn, RequestOptions};
use super_api_runtime::{Endpoint, Store};
use super_api_testing::{MockHttpClient, MockReply};

fn setup(client: &MockHttpClient) -> (Endpoint, Arc<Store<super_api_core::EndpointReducer>>) {
    let definition =
        EndpointDefinition::new("planets", "/api/planets/:planetId/").keyed_by(KeyFn::arg("planetId"));
    let store = Arc::new(Store::new(definition.reducer()));
    let endpoint = Endpoint::new(definition, Arc::new(client.clone()), store.clone());
    (endpoint, store)
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_once_calls_share_one_transport_call() {
    let client = MockHttpClient::new()
        .on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})).after(Duration::from_millis(30)));
    let (planets, store) = setup(&client);
    let args = Args::new().with("planetId", 1);

    let (first, second) = tokio::join!(
        planets.once(args.clone(), RequestOptions::new(), store.as_ref()),
        planets.once(args.clone(), RequestOptions::new(), store.as_ref()),
    );

    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_none());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_once_after_sync_skips_transport() {
    let client = MockHttpClient::new().on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})));
    let (planets, store) = setup(&client);
    let args = Args::new().with("planetId", 1);

    planets.get(args.clone(), RequestOptions::new()).await.unwrap();
    let skipped = planets
        .once(args.clone(), RequestOptions::new(), store.as_ref())
        .await
        .unwrap();

    assert!(skipped.is_none());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_once_fetches_each_key_and_retries_after_failure() {
    let client = MockHttpClient::new()
        .on("/api/planets/1/", MockReply::error(503, json!("unavailable")))
        .on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})))
        .on("/api/planets/2/", MockReply::ok(json!({"name": "Alderaan"})));
    let (planets, store) = setup(&client);
    let one = Args::new().with("planetId", 1);
    let two = Args::new().with("planetId", 2);

    assert!(planets.once(one.clone(), RequestOptions::new(), store.as_ref()).await.is_err());
    assert!(planets.once(one.clone(), RequestOptions::new(), store.as_ref()).await.unwrap().is_some());
    assert!(planets.once(two, RequestOptions::new(), store.as_ref()).await.unwrap().is_some());
    assert!(planets.once(one, RequestOptions::new(), store.as_ref()).await.unwrap().is_none());

    assert_eq!(client.calls_to("/api/planets/1/"), 2);
    assert_eq!(client.calls_to("/api/planets/2/"), 1);
}

#[tokio::test]
async fn test_reset_makes_once_fetch_again() {
    let client = MockHttpClient::new().on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})));
    let (planets, store) = setup(&client);
    let args = Args::new().with("planetId", 1);

    planets.once(args.clone(), RequestOptions::new(), store.as_ref()).await.unwrap();
    planets.reset(args.clone()).unwrap();
    planets.once(args, RequestOptions::new(), store.as_ref()).await.unwrap();

    assert_eq!(client.call_count(), 2);
}
