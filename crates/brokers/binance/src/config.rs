use serde::{Deserialize, Serialize};
use std::fmt;

/// Futures testnet REST endpoint.
pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";
/// Production USDⓈ-M futures REST endpoint.
pub const MAINNET_BASE_URL: &str = "https://fapi.binance.com";

/// Credentials and endpoint for the futures REST API.
#[derive(Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    /// How long after `timestamp` the exchange still accepts a signed request.
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
}

impl BinanceConfig {
    pub fn testnet(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: TESTNET_BASE_URL.to_string(),
            recv_window_ms: 5000,
            timeout_secs: 10,
        }
    }

    pub fn mainnet(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            base_url: MAINNET_BASE_URL.to_string(),
            ..Self::testnet(api_key, api_secret)
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_testnet(&self) -> bool {
        self.base_url.contains("testnet")
    }
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &"***")
            .field("base_url", &self.base_url)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Keep the first four characters of a key for log correlation.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}***")
}
