//! Integration tests for the order API.
//!
//! Each test binds the router to an ephemeral port and drives it over real
//! HTTP; the kitchen is in-memory so no external services are required.

use std::sync::Arc;

use dispatch_api::{api, state::AppState};
use dispatch_kitchen::{Kitchen, KitchenConfig};
use tokio::net::TcpListener;

const TOPOLOGY: &str = r#"
kitchen:
  topology:
    - name: hot
      capacity: 2
      decay_rate: 1
      supported: [hot]
    - name: cold
      capacity: 2
      decay_rate: 0.5
      supported: [cold]
"#;

async fn start_api(topology: &str) -> String {
    let config = KitchenConfig::from_yaml(topology).unwrap();
    let kitchen = Arc::new(Kitchen::new(&config).unwrap());
    let state = AppState::new(kitchen);
    let app = api::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn order_body(name: &str, temp: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "temp": temp,
        "shelfLife": 60.0,
        "decayRate": 0.2,
    })
}

#[tokio::test]
async fn test_create_and_get_order() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{base}/order"))
        .json(&order_body("soup", "hot"))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let created: serde_json::Value = created.json().await.unwrap();
    let id = created["orderID"].as_str().unwrap().to_string();

    let fetched = client
        .get(format!("{base}/order/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(fetched.status(), 200);
    let fetched: serde_json::Value = fetched.json().await.unwrap();
    assert_eq!(fetched["name"], "soup");
    assert_eq!(fetched["state"], "ready");
    assert_eq!(fetched["shelf"], "hot");
    assert_eq!(fetched["shelfLife"], 60.0);
    assert!(fetched["value"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_update_order_through_lifecycle() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/order"))
        .json(&order_body("soup", "hot"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["orderID"].as_str().unwrap().to_string();

    let enroute: serde_json::Value = client
        .post(format!("{base}/order/{id}"))
        .json(&serde_json::json!({"state": "enroute"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(enroute["state"], "enroute");

    let picked_up: serde_json::Value = client
        .post(format!("{base}/order/{id}"))
        .json(&serde_json::json!({"state": "pickedup"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(picked_up["state"], "pickedup");
    assert_eq!(picked_up["shelf"], "");

    // picked-up orders are detached, so lookups miss
    let gone = client
        .get(format!("{base}/order/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn test_update_rejects_wrong_transition() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/order"))
        .json(&order_body("soup", "hot"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["orderID"].as_str().unwrap().to_string();

    // ready -> pickedup skips enroute
    let response = client
        .post(format!("{base}/order/{id}"))
        .json(&serde_json::json!({"state": "pickedup"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "wrong_state");
}

#[tokio::test]
async fn test_update_rejects_unknown_state() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("{base}/order"))
        .json(&order_body("soup", "hot"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["orderID"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{base}/order/{id}"))
        .json(&serde_json::json!({"state": "vaporized"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_list_orders() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    for (name, temp) in [("soup", "hot"), ("icecream", "cold")] {
        let response = client
            .post(format!("{base}/order"))
            .json(&order_body(name, temp))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let listed: serde_json::Value = client
        .get(format!("{base}/order"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["orders"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unsupported_temperature_maps_to_500() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/order"))
        .json(&order_body("pizza", "frozen"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "unsupported_temperature");
}

#[tokio::test]
async fn test_full_topology_maps_to_500() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    for i in 0..2 {
        let response = client
            .post(format!("{base}/order"))
            .json(&order_body(&format!("soup_{i}"), "hot"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = client
        .post(format!("{base}/order"))
        .json(&order_body("overflow", "hot"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "no_shelf_available");
}

#[tokio::test]
async fn test_invalid_shelf_life_rejected() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/order"))
        .json(&serde_json::json!({
            "name": "soup",
            "temp": "hot",
            "shelfLife": -5.0,
            "decayRate": 0.2,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{base}/order/00000000-0000-0000-0000-000000000000"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{base}/order/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_healthz() {
    let base = start_api(TOPOLOGY).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "dispatch-api");
}
