//! One-shot messages carried from a POST to the next `GET /`.
//!
//! Stored as JSON in a signed cookie so tampered or foreign values are
//! dropped rather than rendered. The jar percent-encodes the value, and the
//! queue is kept under the 4096-byte cookie limit browsers enforce.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tracing::debug;

const COOKIE_NAME: &str = "flash";

/// Longest message kept, in characters.
const MAX_MESSAGE_CHARS: usize = 600;

/// Budget for the percent-encoded value. The signature and attributes take
/// the rest of the 4096 bytes.
const MAX_ENCODED_BYTES: usize = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

fn read(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(COOKIE_NAME)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

fn truncate(message: String, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message,
    }
}

/// Length of `value` once percent-encoded.
fn encoded_len(value: &str) -> usize {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => 1,
            _ => 3,
        })
        .sum()
}

/// Serialize `queued`, dropping the oldest messages until it fits. A lone
/// message that is still too long is cut further.
fn encode(queued: &mut Vec<Flash>) -> String {
    loop {
        let json = serde_json::to_string(queued).unwrap_or_default();
        if encoded_len(&json) <= MAX_ENCODED_BYTES {
            return json;
        }
        if queued.len() > 1 {
            queued.remove(0);
            continue;
        }
        let Some(only) = queued.first_mut() else {
            return json;
        };
        let chars = only.message.chars().count();
        if chars <= 16 {
            return json;
        }
        only.message = truncate(std::mem::take(&mut only.message), chars / 2);
    }
}

/// Queue a message for the next page view.
pub fn push(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    debug!(level = flash.level.as_str(), message = %flash.message, "Flash");
    let mut queued = read(&jar);
    queued.push(Flash {
        level: flash.level,
        message: truncate(flash.message, MAX_MESSAGE_CHARS),
    });
    let value = encode(&mut queued);
    jar.add(
        Cookie::build((COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drain queued messages, removing the cookie.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    let queued = read(&jar);
    if queued.is_empty() {
        return (jar, queued);
    }
    (jar.remove(Cookie::build((COOKIE_NAME, "")).path("/")), queued)
}
