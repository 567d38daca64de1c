//! One-shot notices carried between requests in a cookie.
//!
//! Handlers pull a [`FlashBag`] out of the request, add notices before a
//! redirect, or drain them before rendering a page. Returning the bag as part
//! of the response writes the pending notices back, or clears the cookie once
//! everything it carried has been shown.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderValue,
    },
    response::{IntoResponseParts, ResponseParts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FlashBag {
    messages: Vec<Flash>,
    from_cookie: bool,
}

impl FlashBag {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(FlashKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(FlashKind::Error, message.into());
    }

    fn push(&mut self, kind: FlashKind, message: String) {
        self.messages.push(Flash { kind, message });
    }

    /// Consumes the pending notices for display.
    pub fn take(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.messages)
    }

    fn decode(raw: &str) -> Option<Vec<Flash>> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn encode(messages: &[Flash]) -> Option<String> {
        let json = serde_json::to_vec(messages).ok()?;
        Some(URL_SAFE_NO_PAD.encode(json))
    }

    fn set_cookie(&self) -> Option<HeaderValue> {
        let value = if !self.messages.is_empty() {
            let encoded = Self::encode(&self.messages)?;
            format!("{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax")
        } else if self.from_cookie {
            format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
        } else {
            return None;
        };
        match HeaderValue::from_str(&value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "flash cookie is not a valid header value");
                None
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for FlashBag
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .map(|(_, value)| value);

        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let messages = Self::decode(raw).unwrap_or_else(|| {
            debug!("discarding unreadable flash cookie");
            Vec::new()
        });
        Ok(Self {
            messages,
            from_cookie: true,
        })
    }
}

impl IntoResponseParts for FlashBag {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.set_cookie() {
            res.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(res)
    }
}
