//! Integration test: start the gateway on a free port against a fake Graph API and a fake
//! geocoding endpoint (both served locally), then drive a full conversation through POST /webhook.
//! The server tasks are left running when the test ends.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use coordinator::config::Config;
use coordinator::gateway;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Every Graph API call the gateway made: (path, access_token, body).
type GraphLog = Arc<Mutex<Vec<(String, String, Value)>>>;

async fn graph_post(
    State(log): State<GraphLog>,
    Path(path): Path<String>,
    Query(q): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let token = q.get("access_token").cloned().unwrap_or_default();
    log.lock().unwrap().push((path, token, body));
    Json(json!({ "result": "success" }))
}

async fn geocode(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    match q.get("address").map(String::as_str) {
        Some("Paris") => Json(json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Paris, France",
                "geometry": { "location": { "lat": 48.8566, "lng": 2.3522 } }
            }]
        })),
        _ => Json(json!({ "status": "ZERO_RESULTS", "results": [] })),
    }
}

/// Start the fake Graph API + geocoder; returns its base URL and the call log.
async fn start_fake_backend() -> (String, GraphLog) {
    let log: GraphLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/me/:path", post(graph_post))
        .route("/geocode", get(geocode))
        .with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), log)
}

fn sent_texts(log: &GraphLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(path, _, _)| path == "messages")
        .filter_map(|(_, _, body)| body["message"]["text"].as_str().map(str::to_string))
        .collect()
}

async fn wait_for_texts(log: &GraphLog, n: usize) -> Vec<String> {
    for _ in 0..100 {
        let texts = sent_texts(log);
        if texts.len() >= n {
            return texts;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("expected {} replies, got {:?}", n, sent_texts(log));
}

fn webhook_body(sender: &str, item: Value) -> Value {
    let mut event = json!({ "sender": { "id": sender }, "recipient": { "id": "page-1" } });
    for (k, v) in item.as_object().unwrap() {
        event[k] = v.clone();
    }
    json!({ "object": "page", "entry": [{ "id": "page-1", "messaging": [event] }] })
}

#[tokio::test]
async fn webhook_conversation_round_trip() {
    let (backend, graph_log) = start_fake_backend().await;
    let port = free_port();

    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config.messenger.access_token = Some("page-token".to_string());
    config.messenger.verify_token = Some("verify-me".to_string());
    config.messenger.graph_api_base = backend.clone();
    config.geocoding.base_url = format!("{}/geocode", backend);
    config.geocoding.timeout_secs = 5;

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let mut healthy = false;
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/", base)).send().await {
            if resp.status().is_success() {
                let health: Value = resp.json().await.expect("parse JSON");
                assert_eq!(health["runtime"], "running");
                assert_eq!(health["port"].as_u64(), Some(port as u64));
                healthy = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    if !healthy {
        gateway_handle.abort();
        panic!("gateway did not come up on {}", base);
    }

    {
        let calls = graph_log.lock().unwrap();
        let paths: Vec<&str> = calls.iter().map(|(p, _, _)| p.as_str()).collect();
        assert!(paths.contains(&"subscribed_apps"), "{:?}", paths);
        assert!(paths.contains(&"messenger_profile"), "{:?}", paths);
        assert!(calls.iter().all(|(_, token, _)| token == "page-token"));
    }

    let verified = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=42",
            base
        ))
        .send()
        .await
        .expect("verify request");
    assert_eq!(verified.status(), 200);
    assert_eq!(verified.text().await.unwrap(), "42");

    let rejected = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=42",
            base
        ))
        .send()
        .await
        .expect("verify request");
    assert_eq!(rejected.status(), 403);

    let bad = client
        .post(format!("{}/webhook", base))
        .body("not json")
        .send()
        .await
        .expect("post webhook");
    assert_eq!(bad.status(), 400);

    let post = |body: Value| {
        let client = client.clone();
        let url = format!("{}/webhook", base);
        async move {
            let resp = client.post(url).json(&body).send().await.expect("post webhook");
            assert_eq!(resp.status(), 200);
        }
    };

    post(webhook_body("u1", json!({ "postback": { "payload": "COORDINATES" } }))).await;
    assert_eq!(wait_for_texts(&graph_log, 1).await, vec!["Enter destination"]);

    post(webhook_body("u1", json!({ "message": { "mid": "m1", "text": "Atlantis" } }))).await;
    let texts = wait_for_texts(&graph_log, 2).await;
    assert_eq!(texts[1], "There were no resutls. Ask me again, please");

    post(webhook_body("u1", json!({ "message": { "mid": "m2", "text": "Paris" } }))).await;
    let texts = wait_for_texts(&graph_log, 3).await;
    assert_eq!(texts[2], "Latitude: 48.8566, Longitude: 2.3522");

    post(webhook_body("u1", json!({ "message": { "mid": "m3", "text": "thanks" } }))).await;
    let texts = wait_for_texts(&graph_log, 4).await;
    assert_eq!(texts[3], "What do you want to look up?");

    {
        let calls = graph_log.lock().unwrap();
        let typing = calls
            .iter()
            .filter(|(_, _, body)| body["sender_action"] == "typing_on")
            .count();
        assert_eq!(typing, 2);
        let menu = calls
            .iter()
            .rev()
            .find(|(path, _, body)| {
                path == "messages" && body["message"]["quick_replies"].is_array()
            })
            .expect("menu with quick replies");
        assert_eq!(menu.2["recipient"]["id"], "u1");
        assert_eq!(menu.2["message"]["quick_replies"][1]["payload"], "FULL_ADDRESS");
    }

    let health: Value = client
        .get(format!("{}/", base))
        .send()
        .await
        .expect("health")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(health["conversations"].as_u64(), Some(1));

    gateway_handle.abort();
}
