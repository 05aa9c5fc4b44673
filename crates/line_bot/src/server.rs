use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use axum_extra::headers::HeaderMapExt;

use std::sync::Arc;

use api_types::webhook::WebhookBody;
use engine::Engine;

use crate::{LineSignature, Replier, WebhookError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub replier: Arc<dyn Replier>,
    pub channel_secret: Arc<str>,
}

impl ServerState {
    pub fn new(engine: Engine, replier: Arc<dyn Replier>, channel_secret: &str) -> Self {
        Self {
            engine: Arc::new(engine),
            replier,
            channel_secret: Arc::from(channel_secret),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

/// LINE webhook. The signature is checked against the raw bytes before the
/// body is parsed; events are handled one after the other.
async fn callback(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let Some(signature) = headers.typed_get::<LineSignature>() else {
        tracing::warn!("webhook without a valid x-line-signature header");
        return Err(WebhookError::MissingSignature);
    };
    if !signature.verify(&state.channel_secret, &body) {
        tracing::warn!("webhook signature mismatch");
        return Err(WebhookError::InvalidSignature);
    }

    let webhook: WebhookBody = serde_json::from_slice(&body)?;
    tracing::debug!("webhook with {} event(s)", webhook.events.len());

    let mut failure = None;
    for event in &webhook.events {
        let Some((reply_token, text)) = event.text_message() else {
            tracing::debug!("ignoring event: {event:?}");
            continue;
        };

        let outcome = state.engine.handle_text(text).await;
        tracing::info!("handled message {text:?}: {outcome:?}");

        if let Err(err) = state
            .replier
            .reply_text(reply_token, outcome.reply_text())
            .await
        {
            tracing::error!("failed to send reply: {err}");
            if failure.is_none() {
                failure = Some(err);
            }
        }
    }

    match failure {
        Some(err) => Err(err.into()),
        None => Ok("OK"),
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/callback", post(callback))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Webhook listening on {}", addr);

    axum::serve(listener, router(state)).await
}
