use std::{collections::HashMap, env, time::Duration};

use alloy::primitives::Address;
use config::{Config, ConfigError, File};
use demo_core::constants::{SEPOLIA_CHAIN_ID, SEPOLIA_DEFAULT_RPC_URL, SEPOLIA_EXPLORER_URL};
use demo_eip7702_core::constants::BATCH_CALL_DELEGATION_ADDRESS;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub delegation: DelegationConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// The chain both demo flows run against
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub rpc_headers: HashMap<String, String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    pub contract: Address,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "receipt_timeout_secs")]
    pub receipt_timeout: Duration,
}

/// ERC-5792 wallet endpoint; the wallet panel is disabled when `url` is unset
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub url: Option<String>,
    pub account: Option<Address>,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "poll_interval_ms")]
    pub poll_interval: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "poll_timeout_secs")]
    pub poll_timeout: Duration,
    pub headers: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".into(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            name: "Sepolia Testnet".into(),
            rpc_url: SEPOLIA_DEFAULT_RPC_URL.into(),
            explorer_url: SEPOLIA_EXPLORER_URL.into(),
            rpc_headers: HashMap::new(),
        }
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            contract: BATCH_CALL_DELEGATION_ADDRESS,
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            url: None,
            account: None,
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(60),
            headers: HashMap::new(),
        }
    }
}

pub fn get_config() -> Result<DemoConfig, ConfigError> {
    let base_path = env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {e}")))?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment
    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let environment_filename = format!("server_{}.yaml", environment.as_str());

    let config = Config::builder()
        .add_source(File::from(configuration_directory.join("server_base.yaml")).required(false))
        .add_source(
            File::from(configuration_directory.join(environment_filename)).required(false),
        )
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    config.try_deserialize::<DemoConfig>()
}

/// The possible runtime environment for our application.
pub enum Environment {
    Local,
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local`, `development`, or `production`."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_yaml(yaml: &str) -> DemoConfig {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_configuration_targets_sepolia() {
        let config = from_yaml("{}");
        assert_eq!(config.network.chain_id, 11155111);
        assert_eq!(config.network.rpc_url, "https://1rpc.io/sepolia");
        assert_eq!(config.delegation.contract, BATCH_CALL_DELEGATION_ADDRESS);
        assert_eq!(config.wallet.poll_interval, Duration::from_secs(2));
        assert!(config.wallet.url.is_none());
        assert_eq!(config.server.log_format, LogFormat::Pretty);
    }

    #[test]
    fn durations_are_read_from_unit_suffixed_keys() {
        let config = from_yaml(
            r#"
server:
  port: 8080
  log_format: json
delegation:
  receipt_timeout_secs: 15
wallet:
  url: http://127.0.0.1:9545
  poll_interval_ms: 250
  poll_timeout_secs: 5
  headers:
    x-api-key: secret
"#,
        );
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.delegation.receipt_timeout, Duration::from_secs(15));
        assert_eq!(config.wallet.poll_interval, Duration::from_millis(250));
        assert_eq!(config.wallet.poll_timeout, Duration::from_secs(5));
        assert_eq!(config.wallet.url.as_deref(), Some("http://127.0.0.1:9545"));
        assert_eq!(config.wallet.headers["x-api-key"], "secret");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let result: Result<Environment, _> = "staging".to_string().try_into();
        assert!(result.is_err());
    }
}
