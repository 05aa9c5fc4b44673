//! LINE transport.
//!
//! Receives signed webhook deliveries, hands every text message to the
//! [`Engine`] and answers through the Messaging API reply endpoint.

use std::{sync::Arc, time::Duration};

use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::Engine;
use reqwest::{Client, header};
use serde::Serialize;

pub use api::{LINE_API, LineClient, Replier, ReplyError};
pub use server::{ServerState, router, run_with_listener};
pub use signature::LineSignature;

mod api;
mod server;
mod signature;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("missing or malformed x-line-signature header")]
    MissingSignature,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid webhook body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("reply failed: {0}")]
    Reply(#[from] ReplyError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            WebhookError::Reply(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(Error {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub struct Bot {
    state: ServerState,
}

impl Bot {
    pub fn new(
        engine: Engine,
        channel_secret: &str,
        channel_access_token: &str,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, String> {
        let mut auth = header::HeaderValue::try_from(format!("Bearer {channel_access_token}"))
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        let replier = Arc::new(LineClient::new(client, api_base));
        Ok(Self {
            state: ServerState::new(engine, replier, channel_secret),
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(self, addr: &str) -> Result<(), std::io::Error> {
        tracing::info!("Starting LINE bot...");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        run_with_listener(self.state, listener).await
    }
}

#[derive(Default)]
pub struct BotBuilder {
    engine: Option<Engine>,
    channel_secret: String,
    channel_access_token: String,
    api_base: Option<String>,
    timeout: Option<Duration>,
}

impl BotBuilder {
    pub fn engine(mut self, engine: Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn channel(mut self, channel_secret: &str, channel_access_token: &str) -> BotBuilder {
        self.channel_secret = channel_secret.to_string();
        self.channel_access_token = channel_access_token.to_string();
        self
    }

    pub fn api_base(mut self, api_base: &str) -> BotBuilder {
        self.api_base = Some(api_base.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> BotBuilder {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing LINE bot...");
        let engine = self.engine.ok_or("an engine is required")?;
        if self.channel_secret.is_empty() {
            return Err("the LINE channel secret is empty".to_string());
        }
        if self.channel_access_token.is_empty() {
            return Err("the LINE channel access token is empty".to_string());
        }

        Bot::new(
            engine,
            &self.channel_secret,
            &self.channel_access_token,
            self.api_base.as_deref().unwrap_or(LINE_API),
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )
    }
}
