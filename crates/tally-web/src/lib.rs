//! Liveness HTTP endpoint.
//!
//! `GET /` answers a plain liveness string; `GET /health` reports a JSON
//! snapshot of the counter state for external monitors.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use tally_core::{
    counting::CounterStore,
    domain::{iso_timestamp_utc, CounterState},
    Result,
};

#[derive(Clone)]
struct WebState {
    bot_name: String,
    counter: Arc<CounterStore>,
}

pub async fn serve(port: u16, bot_name: String, counter: Arc<CounterStore>) -> Result<()> {
    let state = WebState { bot_name, counter };
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "web server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> &'static str {
    "✅ tally running"
}

async fn health(State(state): State<WebState>) -> Json<serde_json::Value> {
    let snapshot = state.counter.snapshot().await;
    Json(health_payload(&state.bot_name, &snapshot))
}

fn health_payload(bot_name: &str, snapshot: &CounterState) -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "bot": bot_name,
        "count": {
            "lastNumber": snapshot.last_number,
            "lastAcceptorId": snapshot.last_acceptor_id,
        },
        "time": iso_timestamp_utc(),
    })
}
