use alloy::transports::http::reqwest::header::HeaderMap;
use demo_core::{
    chain::{ChainConfig, ChainService, RpcChain},
    error::DemoError,
    rpc_clients::{
        WalletClient,
        transport::{SharedClientTransportBuilder, header_map_from_pairs},
    },
};

use crate::config::{NetworkConfig, WalletConfig};

/// Hands out the configured network, sharing one connection pool across every endpoint
pub struct DemoChainService {
    chain_id: u64,
    explorer_url: String,
    transport_builder: SharedClientTransportBuilder,
    default_chain: RpcChain,
}

impl DemoChainService {
    pub fn new(
        network: &NetworkConfig,
        transport_builder: SharedClientTransportBuilder,
    ) -> Result<Self, DemoError> {
        let rpc_headers = header_map_from_pairs(&network.rpc_headers)?;
        let default_chain = ChainConfig {
            chain_id: network.chain_id,
            rpc_url: &network.rpc_url,
            explorer_url: &network.explorer_url,
            headers: rpc_headers,
            transport_builder: &transport_builder,
        }
        .to_chain()?;

        Ok(Self {
            chain_id: network.chain_id,
            explorer_url: network.explorer_url.clone(),
            transport_builder,
            default_chain,
        })
    }

    pub fn default_chain(&self) -> &RpcChain {
        &self.default_chain
    }

    /// Client for the configured ERC-5792 wallet endpoint, if any
    pub fn wallet_client(&self, wallet: &WalletConfig) -> Result<Option<WalletClient>, DemoError> {
        let Some(url) = wallet.url.as_deref() else {
            return Ok(None);
        };

        let url = url.trim().parse().map_err(|e| DemoError::RpcConfigError {
            message: format!("Failed to parse wallet URL {url:?}: {e}"),
        })?;
        let headers = header_map_from_pairs(&wallet.headers)?;

        Ok(Some(WalletClient::new(
            self.transport_builder.with_headers(url, headers),
        )))
    }
}

#[allow(refining_impl_trait)]
impl ChainService for DemoChainService {
    fn get_chain(&self, rpc_url_override: Option<&str>) -> Result<RpcChain, DemoError> {
        match rpc_url_override.map(str::trim).filter(|url| !url.is_empty()) {
            None => Ok(self.default_chain.clone()),
            // A user-supplied endpoint gets none of the configured RPC headers
            Some(rpc_url) => ChainConfig {
                chain_id: self.chain_id,
                rpc_url,
                explorer_url: &self.explorer_url,
                headers: HeaderMap::new(),
                transport_builder: &self.transport_builder,
            }
            .to_chain(),
        }
    }
}
