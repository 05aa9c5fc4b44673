//! `X-Line-Signature` handling.
//!
//! LINE signs every webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed with the channel secret, and sends the base64 digest in the
//! `x-line-signature` header.

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{Error as HeaderError, Header};
use base64::{Engine, prelude::BASE64_STANDARD};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

static LINE_SIGNATURE: HeaderName = HeaderName::from_static("x-line-signature");

/// `TypedHeader` for the webhook signature, already base64-decoded.
#[derive(Debug, Clone)]
pub struct LineSignature(pub Vec<u8>);

impl Header for LineSignature {
    fn name() -> &'static HeaderName {
        &LINE_SIGNATURE
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, HeaderError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(HeaderError::invalid());
        };
        let Ok(digest) = BASE64_STANDARD.decode(value.trim()) else {
            return Err(HeaderError::invalid());
        };

        Ok(LineSignature(digest))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let encoded = BASE64_STANDARD.encode(&self.0);
        match HeaderValue::from_str(&encoded) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-line-signature header"),
        }
    }
}

impl LineSignature {
    /// Signature of `body` under `channel_secret`.
    pub fn sign(channel_secret: &str, body: &[u8]) -> Result<Self, InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())?;
        mac.update(body);
        Ok(LineSignature(mac.finalize().into_bytes().to_vec()))
    }

    /// Constant-time check of this signature against `body`.
    pub fn verify(&self, channel_secret: &str, body: &[u8]) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&self.0).is_ok()
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }
}
