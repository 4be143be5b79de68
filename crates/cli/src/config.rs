use futbot_brokers_binance::{BinanceConfig, MAINNET_BASE_URL, TESTNET_BASE_URL};
use futbot_brokers_common::PaperExchangeConfig;
use futbot_risk::OrderLimits;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Read when `--config` is not given and the file exists in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "futbot.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Everything that is not a secret. Every table and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeSettings,
    pub risk: OrderLimits,
    pub web: WebSettings,
    pub logging: LoggingSettings,
    pub paper: PaperExchangeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub testnet: bool,
    /// Overrides the network's default endpoint.
    pub base_url: Option<String>,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            testnet: true,
            base_url: None,
            recv_window_ms: 5000,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    pub bind: String,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("trading_bot.log"),
        }
    }
}

impl AppConfig {
    /// Load `explicit`, else `futbot.toml` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Client settings for the selected network. `mainnet` forces production.
    pub fn binance(&self, api_key: &str, api_secret: &str, mainnet: bool) -> BinanceConfig {
        let on_testnet = self.exchange.testnet && !mainnet;
        let default_url = if on_testnet {
            TESTNET_BASE_URL
        } else {
            MAINNET_BASE_URL
        };
        BinanceConfig {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            base_url: self
                .exchange
                .base_url
                .clone()
                .unwrap_or_else(|| default_url.to_string()),
            recv_window_ms: self.exchange.recv_window_ms,
            timeout_secs: self.exchange.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::default();
        assert!(config.exchange.testnet);
        assert_eq!(config.web.bind, "127.0.0.1:5000");
        assert_eq!(config.logging.file, PathBuf::from("trading_bot.log"));
        assert_eq!(config.risk.min_notional, dec!(100));
        assert_eq!(
            config.binance("k", "s", false).base_url,
            TESTNET_BASE_URL
        );
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[risk]
min_notional = "5"

[web]
bind = "0.0.0.0:8080"

[paper]
balances = {{ USDT = "2500" }}
mark_prices = {{ ETHUSDT = "3000.5" }}
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.risk.min_notional, dec!(5));
        assert_eq!(config.risk.quote_asset, "USDT");
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.paper.balances["USDT"], dec!(2500));
        assert_eq!(config.paper.mark_prices["ETHUSDT"], dec!(3000.5));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_network_selection() {
        let config: AppConfig =
            toml::from_str("[exchange]\ntestnet = false\nrecv_window_ms = 10000").unwrap();
        let binance = config.binance("k", "s", false);
        assert_eq!(binance.base_url, MAINNET_BASE_URL);
        assert_eq!(binance.recv_window_ms, 10000);

        let config = AppConfig::default();
        assert_eq!(config.binance("k", "s", true).base_url, MAINNET_BASE_URL);

        let config: AppConfig =
            toml::from_str("[exchange]\nbase_url = \"http://localhost:9000\"").unwrap();
        assert_eq!(config.binance("k", "s", false).base_url, "http://localhost:9000");
    }

    #[test]
    fn test_errors_name_the_file() {
        let missing = AppConfig::load(Some(Path::new("/nonexistent/futbot.toml"))).unwrap_err();
        assert!(missing.to_string().contains("/nonexistent/futbot.toml"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[web\nbind = 1").unwrap();
        let invalid = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(invalid, ConfigError::Parse { .. }));
    }
}
