use api_types::reply::{ApiErrorBody, ReplyMessage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

pub const LINE_API: &str = "https://api.line.me";

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

/// Outbound side of the transport: delivers one text reply for a reply token.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply_text(&self, reply_token: &str, text: String) -> Result<(), ReplyError>;
}

/// Messaging API client. The bearer token lives in the client's default
/// headers.
#[derive(Clone, Debug)]
pub struct LineClient {
    client: Client,
    base_url: String,
}

impl LineClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json_unit<TReq: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<(), ReplyError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = match resp.json::<ApiErrorBody>().await {
            Ok(err) => err.message,
            Err(_) => "line api error".to_string(),
        };
        Err(ReplyError::Server { status, message })
    }
}

#[async_trait]
impl Replier for LineClient {
    async fn reply_text(&self, reply_token: &str, text: String) -> Result<(), ReplyError> {
        self.post_json_unit("/v2/bot/message/reply", &ReplyMessage::text(reply_token, text))
            .await
    }
}
