//! Gateway HTTP server (single port).

use crate::channels::{InboundEvent, MessengerChannel, WebhookPayload};
use crate::config::{self, Config};
use crate::conversation::{thread_profile, Dispatcher, ModeStore};
use crate::gateway::protocol::{Health, VerifyParams};
use crate::geocoding::GeocodingClient;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Inbound events waiting for the dispatcher. A full queue makes the webhook answer 503.
const INBOUND_QUEUE_CAPACITY: usize = 256;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub port: u16,
    /// Token Messenger must present when verifying the webhook.
    pub verify_token: Arc<String>,
    /// Sender for inbound events; the processor task receives and dispatches them in order.
    pub inbound_tx: mpsc::Sender<InboundEvent>,
    pub store: Arc<ModeStore>,
}

/// Subscribe the page to webhooks and apply greeting, get-started and persistent menu.
async fn apply_page_setup(channel: &MessengerChannel) -> Result<()> {
    channel
        .subscribe_page()
        .await
        .context("subscribing page to webhooks")?;
    channel
        .set_thread_profile(&thread_profile())
        .await
        .context("setting messenger profile")?;
    Ok(())
}

/// One-off page setup from config (the `setup` command). Requires an access token.
pub async fn configure_page(config: &Config) -> Result<()> {
    let token = config::resolve_access_token(config).context(
        "messenger access token not configured (set ACCESS_TOKEN or messenger.accessToken)",
    )?;
    let channel = MessengerChannel::new(
        Some(token),
        Some(config.messenger.graph_api_base.clone()),
    );
    apply_page_setup(&channel).await?;
    log::info!("messenger page subscribed and profile applied");
    Ok(())
}

/// Run the webhook gateway; binds to config.gateway.bind:config.gateway.port.
/// Requires a page access token and a verify token. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let access_token = config::resolve_access_token(&config).context(
        "messenger access token not configured (set ACCESS_TOKEN or messenger.accessToken)",
    )?;
    let verify_token = config::resolve_verify_token(&config).context(
        "webhook verify token not configured (set VERIFY_TOKEN or messenger.verifyToken)",
    )?;
    if config::resolve_geocoding_key(&config).is_none() {
        log::warn!("no geocoding api key configured; lookups may be rejected by the provider");
    }

    let channel = Arc::new(MessengerChannel::new(
        Some(access_token),
        Some(config.messenger.graph_api_base.clone()),
    ));
    if config.messenger.setup_thread {
        match apply_page_setup(&channel).await {
            Ok(()) => log::info!("messenger page subscribed and profile applied"),
            Err(e) => log::warn!("messenger page setup failed: {:#}", e),
        }
    }

    let geocoder = Arc::new(GeocodingClient::new(
        Some(config.geocoding.base_url.clone()),
        config::resolve_geocoding_key(&config),
        Some(config.geocoding.timeout()),
    ));
    let store = Arc::new(ModeStore::new(config.conversation.idle_timeout()));
    let dispatcher = Dispatcher::new(store.clone(), geocoder, channel);

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundEvent>(INBOUND_QUEUE_CAPACITY);
    let processor: JoinHandle<()> = tokio::spawn(async move {
        while let Some(event) = inbound_rx.recv().await {
            dispatcher.handle(event).await;
        }
        log::debug!("dispatch: inbound queue closed");
    });

    let sweeper = spawn_sweeper(store.clone(), config.conversation.sweep_interval());

    let bind = config.gateway.bind.trim();
    let state = GatewayState {
        port: config.gateway.port,
        verify_token: Arc::new(verify_token),
        inbound_tx,
        store,
    };
    let app = Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state);

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;

    sweeper.abort();
    // the router (and its inbound_tx clones) is gone, so the processor drains and stops
    let _ = processor.await;
    log::info!("gateway stopped");
    Ok(())
}

/// Periodically forget senders that have been idle longer than the configured timeout.
fn spawn_sweeper(store: Arc<ModeStore>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle().await;
            if evicted > 0 {
                log::debug!("evicted {} idle conversation(s)", evicted);
            }
        }
    })
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /webhook — Messenger verification handshake; echoes hub.challenge when the token matches.
async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, StatusCode> {
    match params.accept(&state.verify_token) {
        Some(challenge) => {
            log::info!("messenger webhook verified");
            Ok(challenge.to_string())
        }
        None => {
            log::warn!("messenger webhook verification rejected");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// POST /webhook — receives Messenger event JSON and queues each event for the dispatcher.
async fn receive_webhook(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("messenger webhook: bad payload: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    if let Err(e) = enqueue_batch(&state.inbound_tx, payload.into_events()) {
        log::warn!("messenger webhook: inbound queue unavailable: {}", e);
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

/// Queue every event of one delivery or none of them, so a redelivered batch is never
/// dispatched twice.
fn enqueue_batch(
    tx: &mpsc::Sender<InboundEvent>,
    events: Vec<InboundEvent>,
) -> Result<(), TrySendError<()>> {
    if events.is_empty() {
        return Ok(());
    }
    if events.len() > tx.capacity() {
        return Err(TrySendError::Full(()));
    }
    let permits = tx.try_reserve_many(events.len())?;
    for (permit, event) in permits.zip(events) {
        permit.send(event);
    }
    Ok(())
}

/// GET / returns a simple health JSON (for liveness checks).
async fn health_http(State(state): State<GatewayState>) -> Json<Health> {
    Json(Health {
        runtime: "running".to_string(),
        conversations: state.store.len().await,
        port: state.port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn postback(sender: &str, payload: &str) -> InboundEvent {
        InboundEvent::Postback {
            sender_id: sender.to_string(),
            payload: payload.to_string(),
        }
    }

    fn state_with_queue(capacity: usize) -> (GatewayState, mpsc::Receiver<InboundEvent>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let state = GatewayState {
            port: 0,
            verify_token: Arc::new("verify-me".to_string()),
            inbound_tx,
            store: Arc::new(ModeStore::new(Duration::from_secs(60))),
        };
        (state, inbound_rx)
    }

    fn body(json: &'static str) -> Bytes {
        Bytes::from_static(json.as_bytes())
    }

    const TWO_EVENT_BODY: &str = r#"{
        "object": "page",
        "entry": [{ "messaging": [
            { "sender": { "id": "u1" }, "postback": { "payload": "COORDINATES" } },
            { "sender": { "id": "u2" }, "postback": { "payload": "START" } }
        ] }]
    }"#;

    #[test]
    fn batch_larger_than_free_room_queues_nothing() {
        let (tx, mut rx) = mpsc::channel(1);
        let events = vec![postback("u1", "COORDINATES"), postback("u2", "START")];
        assert!(enqueue_batch(&tx, events).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn batch_that_fits_is_queued_in_order() {
        let (tx, mut rx) = mpsc::channel(2);
        let events = vec![postback("u1", "COORDINATES"), postback("u2", "START")];
        enqueue_batch(&tx, events).unwrap();
        assert_eq!(rx.try_recv().unwrap(), postback("u1", "COORDINATES"));
        assert_eq!(rx.try_recv().unwrap(), postback("u2", "START"));
        assert!(enqueue_batch(&tx, Vec::new()).is_ok());
    }

    #[tokio::test]
    async fn full_queue_answers_503_without_partial_enqueue() {
        let (state, mut rx) = state_with_queue(1);
        let status = receive_webhook(State(state), body(TWO_EVENT_BODY)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn webhook_queues_whole_batch_and_ignores_other_objects() {
        let (state, mut rx) = state_with_queue(4);
        let status = receive_webhook(State(state.clone()), body(TWO_EVENT_BODY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rx.try_recv().unwrap(), postback("u1", "COORDINATES"));
        assert_eq!(rx.try_recv().unwrap(), postback("u2", "START"));

        let other = r#"{ "object": "instagram", "entry": [{ "messaging": [
            { "sender": { "id": "u1" }, "message": { "text": "hi" } }
        ] }] }"#;
        let status = receive_webhook(State(state), body(other)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }
}
