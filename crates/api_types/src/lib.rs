//! Wire types of the LINE Messaging API used by the bot.
//!
//! Only the fields the bot reads are modelled; anything else in a webhook
//! body is ignored, and unknown event or message types deserialize to an
//! `Other` variant instead of failing the whole body.

use serde::{Deserialize, Serialize};

pub mod webhook {
    use super::*;

    /// Body of a `POST /callback` webhook delivery.
    #[derive(Debug, Deserialize)]
    pub struct WebhookBody {
        #[serde(default)]
        pub events: Vec<Event>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    pub enum Event {
        Message(MessageEvent),
        #[serde(other)]
        Other,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageEvent {
        /// Missing for redelivered or standby events; such events cannot be
        /// answered.
        #[serde(default)]
        pub reply_token: Option<String>,
        pub message: Message,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    pub enum Message {
        Text(TextMessage),
        #[serde(other)]
        Other,
    }

    #[derive(Debug, Deserialize)]
    pub struct TextMessage {
        pub text: String,
    }

    impl Event {
        /// Reply token and text of a text message event.
        pub fn text_message(&self) -> Option<(&str, &str)> {
            match self {
                Event::Message(MessageEvent {
                    reply_token: Some(token),
                    message: Message::Text(text),
                    ..
                }) => Some((token.as_str(), text.text.as_str())),
                _ => None,
            }
        }
    }
}

pub mod reply {
    use super::*;

    /// Body of `POST /v2/bot/message/reply`.
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReplyMessage {
        pub reply_token: String,
        pub messages: Vec<OutboundMessage>,
    }

    #[derive(Debug, Serialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    pub enum OutboundMessage {
        Text { text: String },
    }

    impl ReplyMessage {
        pub fn text(reply_token: &str, text: String) -> Self {
            Self {
                reply_token: reply_token.to_string(),
                messages: vec![OutboundMessage::Text { text }],
            }
        }
    }

    /// Error body returned by the Messaging API.
    #[derive(Debug, Deserialize)]
    pub struct ApiErrorBody {
        pub message: String,
    }
}
