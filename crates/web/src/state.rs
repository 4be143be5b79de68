use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use futbot_engine::TradingBot;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Shared application state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when credentials were missing or the exchange was unreachable at startup.
    pub bot: Option<Arc<TradingBot>>,
    /// Signs the flash cookie.
    pub cookie_key: Key,
    /// Shown on the dashboard ("testnet", "mainnet" or "paper").
    pub network: String,
}

impl AppState {
    pub fn new(bot: Option<Arc<TradingBot>>, cookie_key: Key, network: impl Into<String>) -> Self {
        Self {
            bot,
            cookie_key,
            network: network.into(),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie signing key from a secret.
///
/// Without a secret the key is random, so flash cookies do not survive a restart.
pub fn cookie_key(secret: Option<&str>) -> Key {
    let digest = match secret.filter(|s| !s.is_empty()) {
        Some(secret) => Sha512::digest(secret.as_bytes()),
        None => {
            warn!("FUTBOT_SECRET_KEY not set; using a per-process cookie key");
            let mut hasher = Sha512::new();
            hasher.update(Uuid::new_v4().as_bytes());
            hasher.update(Uuid::new_v4().as_bytes());
            hasher.finalize()
        }
    };
    Key::from(digest.as_slice())
}
