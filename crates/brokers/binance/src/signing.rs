use futbot_core::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of the query string, keyed by the API secret.
pub fn sign(secret: &str, query: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Config(format!("Invalid API secret: {}", e)))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Milliseconds since the Unix epoch, as the exchange expects in `timestamp`.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Append `recvWindow`, `timestamp` and `signature` to an encoded query.
pub fn signed_query(
    secret: &str,
    query: &str,
    recv_window_ms: u64,
    timestamp: u64,
) -> Result<String, ExchangeError> {
    let mut payload = String::with_capacity(query.len() + 48);
    payload.push_str(query);
    if !payload.is_empty() {
        payload.push('&');
    }
    payload.push_str(&format!("recvWindow={recv_window_ms}&timestamp={timestamp}"));
    let signature = sign(secret, &payload)?;
    Ok(format!("{payload}&signature={signature}"))
}
