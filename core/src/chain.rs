use crate::rpc_clients::transport::SharedClientTransportBuilder;
use alloy::{
    primitives::{Address, TxHash},
    providers::RootProvider,
    rpc::client::RpcClient,
    transports::http::reqwest::{Url, header::HeaderMap},
};

use crate::error::DemoError;

pub trait Chain: Send + Sync {
    fn chain_id(&self) -> u64;
    fn rpc_url(&self) -> Url;
    fn provider(&self) -> &RootProvider;
    fn explorer(&self) -> &Explorer;
}

/// Block explorer links for a chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Explorer {
    base_url: String,
}

impl Explorer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn address_url(&self, address: Address) -> String {
        format!("{}/address/{address}", self.base_url)
    }

    pub fn tx_url(&self, hash: TxHash) -> String {
        format!("{}/tx/{hash}", self.base_url)
    }
}

pub struct ChainConfig<'a> {
    pub chain_id: u64,
    pub rpc_url: &'a str,
    pub explorer_url: &'a str,
    pub headers: HeaderMap,
    pub transport_builder: &'a SharedClientTransportBuilder,
}

#[derive(Clone, Debug)]
pub struct RpcChain {
    chain_id: u64,
    rpc_url: Url,
    explorer: Explorer,
    pub provider: RootProvider,
}

impl Chain for RpcChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn rpc_url(&self) -> Url {
        self.rpc_url.clone()
    }

    fn provider(&self) -> &RootProvider {
        &self.provider
    }

    fn explorer(&self) -> &Explorer {
        &self.explorer
    }
}

impl ChainConfig<'_> {
    pub fn to_chain(&self) -> Result<RpcChain, DemoError> {
        let rpc_url = Url::parse(self.rpc_url.trim()).map_err(|e| DemoError::RpcConfigError {
            message: format!("Failed to parse RPC URL {:?}: {e}", self.rpc_url),
        })?;

        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(DemoError::RpcConfigError {
                message: format!("Unsupported RPC URL scheme: {}", rpc_url.scheme()),
            });
        }

        let transport = self
            .transport_builder
            .with_headers(rpc_url.clone(), self.headers.clone());
        let rpc_client = RpcClient::builder().transport(transport, false);

        Ok(RpcChain {
            chain_id: self.chain_id,
            rpc_url,
            explorer: Explorer::new(self.explorer_url),
            provider: RootProvider::new(rpc_client),
        })
    }
}

pub trait ChainService {
    /// Chain handle for the configured network, optionally talking to a different RPC endpoint
    fn get_chain(&self, rpc_url_override: Option<&str>) -> Result<impl Chain + Clone, DemoError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    fn builder() -> SharedClientTransportBuilder {
        SharedClientTransportBuilder::with_new_client().unwrap()
    }

    #[test]
    fn explorer_links_follow_etherscan_layout() {
        let explorer = Explorer::new("https://sepolia.etherscan.io/");
        assert_eq!(
            explorer.address_url(address!("0x4Cd241E8d1510e30b2076397afc7508Ae59C66c9")),
            "https://sepolia.etherscan.io/address/0x4Cd241E8d1510e30b2076397afc7508Ae59C66c9"
        );
        assert_eq!(
            explorer.tx_url(b256!(
                "0x0000000000000000000000000000000000000000000000000000000000000abc"
            )),
            "https://sepolia.etherscan.io/tx/0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
    }

    #[test]
    fn chain_config_rejects_malformed_urls() {
        let builder = builder();
        let err = ChainConfig {
            chain_id: 11155111,
            rpc_url: "not a url",
            explorer_url: "https://sepolia.etherscan.io",
            headers: HeaderMap::new(),
            transport_builder: &builder,
        }
        .to_chain()
        .unwrap_err();
        assert!(matches!(err, DemoError::RpcConfigError { .. }));

        let err = ChainConfig {
            chain_id: 11155111,
            rpc_url: "ws://127.0.0.1:8545",
            explorer_url: "https://sepolia.etherscan.io",
            headers: HeaderMap::new(),
            transport_builder: &builder,
        }
        .to_chain()
        .unwrap_err();
        assert!(matches!(err, DemoError::RpcConfigError { .. }));
    }

    #[test]
    fn chain_config_builds_chain() {
        let builder = builder();
        let chain = ChainConfig {
            chain_id: 31337,
            rpc_url: "http://127.0.0.1:8545",
            explorer_url: "https://sepolia.etherscan.io",
            headers: HeaderMap::new(),
            transport_builder: &builder,
        }
        .to_chain()
        .unwrap();
        assert_eq!(chain.chain_id(), 31337);
        assert_eq!(chain.rpc_url().as_str(), "http://127.0.0.1:8545/");
    }
}
