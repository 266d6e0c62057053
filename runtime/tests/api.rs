//! Endpoint registry driving one shared store.

#![allow(clippy::unwrap_used)] // Test code

use serde_json::json;
use std::sync::Arc;
use super_api_core::{Args, EndpointState, RequestKey, RequestOptions, RequestPhase};
use super_api_runtime::{Api, ApiBuilder, ApiConfig, Store};
use super_api_testing::{MockHttpClient, MockReply};

const CONFIG: &str = r#"{
    "namespace": "@@swapi",
    "default_options": { "get": { "headers": { "accept": "application/json" } } },
    "endpoints": {
        "people": { "url": "/api/people/" },
        "planets": { "url": "/api/planets/:planetId/", "key_args": ["planetId"] }
    }
}"#;

#[tokio::test]
async fn test_registry_shares_store_and_isolates_endpoints() {
    let client = MockHttpClient::new()
        .on("/api/people/", MockReply::ok(json!([{"name": "Luke"}])))
        .on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})));
    let builder = ApiBuilder::from_config(&ApiConfig::from_json(CONFIG).unwrap());
    let store = Arc::new(Store::new(builder.reducer().unwrap()));
    let api = builder.build(Arc::new(client.clone()), store.clone()).unwrap();
    let mut actions = store.subscribe_actions();

    api.endpoint("planets")
        .unwrap()
        .get(Args::new().with("planetId", 1), RequestOptions::new())
        .await
        .unwrap();

    let first = actions.try_recv().unwrap();
    assert_eq!(first.type_name(), "@@swapi@planets_request");
    assert_eq!(
        client.calls()[0].options.headers.get("accept").map(String::as_str),
        Some("application/json")
    );

    let (people, planet) = store.state(|s| {
        (
            s.endpoint("people").cloned().unwrap(),
            s.endpoint("planets").and_then(|p| p.slot(&RequestKey::new("1")).cloned()),
        )
    });
    assert_eq!(people, EndpointState::default());
    assert_eq!(planet.unwrap().phase(), RequestPhase::Synced);
}

#[tokio::test]
async fn test_once_against_registry_state() {
    let client = MockHttpClient::new().on("/api/people/", MockReply::ok(json!([])));
    let builder = Api::builder().endpoint(super_api_core::EndpointDefinition::new("people", "/api/people/"));
    let store = Arc::new(Store::new(builder.reducer().unwrap()));
    let api = builder.build(Arc::new(client.clone()), store.clone()).unwrap();
    let people = api.endpoint("people").unwrap();

    people.once(Args::new(), RequestOptions::new(), store.as_ref()).await.unwrap();
    let skipped = people.once(Args::new(), RequestOptions::new(), store.as_ref()).await.unwrap();

    assert!(skipped.is_none());
    assert_eq!(client.call_count(), 1);
}

#[test]
fn test_store_from_api_matches_initial_state() {
    let api = Api::from_config(
        &ApiConfig::from_json(CONFIG).unwrap(),
        Arc::new(MockHttpClient::new()),
        Arc::new(super_api_testing::RecordingSink::new()),
    )
    .unwrap();
    let store = Store::new(api.reducer());

    assert_eq!(store.snapshot(), api.initial_state());
    assert_eq!(api.endpoints().count(), 2);
}
