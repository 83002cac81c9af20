// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Ingress connector: bridges an external "new code pushed" signal
//! into the internal update-requested event.
//!
//! Exactly one transport runs per instance, resolved once at startup:
//! a message-queue consumer or a minimal webhook listener. Both
//! converge on [`forward`], the seam the runner's update subscription
//! hangs off.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use forge_core::{topics, Connections, EventBus, HttpSettings, Payload, QueueSettings};
use futures_util::StreamExt;
use lapin::options::{BasicConsumeOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IngressError {
    #[error("queue connection failed: {0}")]
    Queue(#[from] lapin::Error),

    #[error("failed to bind webhook listener on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// The configured ingress transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingress {
    Queue(QueueSettings),
    Http(HttpSettings),
}

impl Ingress {
    /// Resolve the transport from config: an explicit `use` setting
    /// wins, else the rabbitmq block, else the http block.
    pub fn from_config(connections: &Connections) -> Option<Self> {
        match connections.use_.as_deref() {
            Some("rabbitmq") => connections.rabbitmq.clone().map(Ingress::Queue),
            Some("http") => connections.http.clone().map(Ingress::Http),
            Some(other) => {
                warn!(transport = other, "unknown connections.use value");
                None
            }
            None => connections
                .rabbitmq
                .clone()
                .map(Ingress::Queue)
                .or_else(|| connections.http.clone().map(Ingress::Http)),
        }
    }

    /// Run the transport until the process exits. Consumes self; the
    /// caller spawns this as a task.
    pub async fn start(self, bus: EventBus) -> Result<(), IngressError> {
        match self {
            Ingress::Queue(settings) => consume_queue(bus, settings).await,
            Ingress::Http(settings) => serve_webhook(bus, settings).await,
        }
    }
}

/// The single seam both transports converge on: republish the payload
/// as an update-requested event.
pub fn forward(bus: &EventBus, payload: Value) {
    bus.publish(topics::APP_SIGNAL_UPDATE, Payload::Json { value: payload });
}

async fn consume_queue(bus: EventBus, settings: QueueSettings) -> Result<(), IngressError> {
    let conn = Connection::connect(&settings.uri, ConnectionProperties::default()).await?;
    let channel = conn.create_channel().await?;
    channel
        .queue_declare(&settings.queue, QueueDeclareOptions::default(), FieldTable::default())
        .await?;
    channel
        .queue_bind(
            &settings.queue,
            &settings.exchange,
            &settings.key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;
    info!(key = %settings.key, "queue connection bound");

    let mut consumer = channel
        .basic_consume(
            &settings.queue,
            "forge",
            BasicConsumeOptions { no_ack: true, ..BasicConsumeOptions::default() },
            FieldTable::default(),
        )
        .await?;

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let body = String::from_utf8_lossy(&delivery.data);
                info!("message received");
                // The broker routing already guaranteed relevance via
                // the bound key; the body is forwarded verbatim.
                let payload =
                    serde_json::from_str(&body).unwrap_or(Value::String(body.into_owned()));
                forward(&bus, payload);
            }
            Err(e) => warn!(error = %e, "queue delivery error"),
        }
    }
    Ok(())
}

#[derive(Clone)]
struct HookState {
    bus: EventBus,
    key: String,
}

async fn serve_webhook(bus: EventBus, settings: HttpSettings) -> Result<(), IngressError> {
    let state = HookState { bus, key: settings.key.clone() };
    let app = Router::new()
        .route("/", post(receive_hook))
        .fallback(|| async { StatusCode::OK })
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| IngressError::Bind { port: settings.port, source })?;
    info!(port = settings.port, "HTTP server listening for updates");
    axum::serve(listener, app).await.map_err(|source| IngressError::Bind {
        port: settings.port,
        source,
    })
}

/// Webhook endpoint. Always answers 200 with an empty body;
/// mismatched or malformed payloads are acknowledged and dropped, not
/// errored, since webhook endpoints commonly receive unrelated pushes.
async fn receive_hook(State(state): State<HookState>, body: String) -> StatusCode {
    if let Some(payload) = parse_hook_body(&body) {
        if repo_matches(&state.key, &payload) {
            forward(&state.bus, payload);
        }
    }
    StatusCode::OK
}

/// Extract the JSON document from a `payload=<url-encoded JSON>` form
/// body.
pub fn parse_hook_body(body: &str) -> Option<Value> {
    let raw = form_urlencoded::parse(body.as_bytes())
        .find(|(name, _)| name == "payload")
        .map(|(_, value)| value.into_owned())?;
    serde_json::from_str(&raw).ok()
}

/// A payload targets the configured repository when its owner, name,
/// and ref suffix all match the routing key `owner.name.branch`.
pub fn repo_matches(key: &str, payload: &Value) -> bool {
    let mut parts = key.splitn(3, '.');
    let (Some(owner), Some(name), Some(branch)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let repo = &payload["repository"];
    repo["name"].as_str() == Some(name)
        && repo["owner"]["name"].as_str() == Some(owner)
        && payload["ref"]
            .as_str()
            .is_some_and(|r| r.ends_with(&format!("/{}", branch)))
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod tests;
