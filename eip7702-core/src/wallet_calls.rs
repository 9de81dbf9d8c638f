use std::time::Duration;

use alloy::primitives::Address;
use demo_core::{
    error::{AlloyRpcErrorToDemoError, DemoError},
    rpc_clients::{
        WalletClient,
        wallet::{CallsStatusResponse, SendCallsRequest, WalletCapabilities},
    },
    transaction::InnerCall,
};
use serde::Serialize;
use tokio::time::{Instant, sleep};

/// Wallets known to handle `wallet_sendCalls`
pub const SUPPORTED_WALLETS: &[&str] = &[
    "Coinbase Smart Wallet",
    "MetaMask (with smart transactions)",
    "Ambire Wallet",
];

/// Account the wallet exposes, and the chain it is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccount {
    pub address: Address,
    pub chain_id: u64,
}

/// Outcome of asking a wallet for its capabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum BatchSupport {
    Supported {
        capabilities: WalletCapabilities,
    },
    /// The wallet answered, but not with atomic batching on this chain
    Unsupported {
        capabilities: WalletCapabilities,
        supported_wallets: Vec<String>,
    },
    /// `wallet_getCapabilities` itself failed
    CapabilitiesUnavailable {
        message: String,
        supported_wallets: Vec<String>,
    },
}

impl BatchSupport {
    pub fn is_supported(&self) -> bool {
        matches!(self, BatchSupport::Supported { .. })
    }
}

fn supported_wallets() -> Vec<String> {
    SUPPORTED_WALLETS.iter().map(|w| w.to_string()).collect()
}

/// ERC-5792 batch flow against one wallet endpoint
#[derive(Debug, Clone)]
pub struct WalletBatchCalls {
    client: WalletClient,
    account: Option<Address>,
}

impl WalletBatchCalls {
    /// `account` pins the sender; otherwise the wallet's first account is used
    pub fn new(client: WalletClient, account: Option<Address>) -> Self {
        Self { client, account }
    }

    pub fn client(&self) -> &WalletClient {
        &self.client
    }

    fn wallet_error(&self, e: alloy::transports::TransportError) -> DemoError {
        e.to_wallet_error(self.client.url().as_str())
    }

    pub async fn connected_account(&self) -> Result<ConnectedAccount, DemoError> {
        let address = match self.account {
            Some(address) => address,
            None => self
                .client
                .accounts()
                .await
                .map_err(|e| self.wallet_error(e))?
                .first()
                .copied()
                .ok_or_else(|| DemoError::ValidationError {
                    message: "Wallet did not expose any account".to_string(),
                })?,
        };

        let chain_id = self
            .client
            .chain_id()
            .await
            .map_err(|e| self.wallet_error(e))?;

        Ok(ConnectedAccount { address, chain_id })
    }

    /// Never fails on a capabilities error: that is reported as `CapabilitiesUnavailable`
    pub async fn detect_batch_support(&self, account: &ConnectedAccount) -> BatchSupport {
        match self.client.get_capabilities(account.address).await {
            Ok(capabilities) => {
                let supported = capabilities
                    .for_chain(account.chain_id)
                    .is_some_and(|caps| caps.supports_atomic_batch());

                tracing::debug!(
                    account = ?account.address,
                    chain_id = account.chain_id,
                    supported,
                    "Wallet capabilities"
                );

                if supported {
                    BatchSupport::Supported { capabilities }
                } else {
                    BatchSupport::Unsupported {
                        capabilities,
                        supported_wallets: supported_wallets(),
                    }
                }
            }
            Err(e) => {
                let error = self.wallet_error(e);
                tracing::warn!(account = ?account.address, error = %error, "wallet_getCapabilities failed");
                BatchSupport::CapabilitiesUnavailable {
                    message: error.to_string(),
                    supported_wallets: supported_wallets(),
                }
            }
        }
    }

    /// Submit `calls` atomically from `account`; returns the calls id
    pub async fn send_batch(
        &self,
        account: &ConnectedAccount,
        calls: &[InnerCall],
    ) -> Result<String, DemoError> {
        if calls.is_empty() {
            return Err(DemoError::ValidationError {
                message: "A batch needs at least one call".to_string(),
            });
        }

        let request = SendCallsRequest::atomic(account.chain_id, account.address, calls);
        let id = self
            .client
            .send_calls(&request)
            .await
            .map_err(|e| self.wallet_error(e))?;

        tracing::info!(
            account = ?account.address,
            chain_id = account.chain_id,
            calls = calls.len(),
            calls_id = %id,
            "Wallet accepted batch"
        );

        Ok(id)
    }

    pub async fn calls_status(&self, id: &str) -> Result<CallsStatusResponse, DemoError> {
        self.client
            .get_calls_status(id)
            .await
            .map_err(|e| self.wallet_error(e))
    }

    /// Poll until the batch leaves the pending state or `timeout` elapses.
    /// On timeout the last (pending) status is returned.
    pub async fn wait_for_calls_status(
        &self,
        id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<CallsStatusResponse, DemoError> {
        let deadline = Instant::now() + timeout;

        loop {
            let status = self.calls_status(id).await?;
            if status.status.is_final() {
                tracing::debug!(calls_id = %id, status = ?status.status, "Batch settled");
                return Ok(status);
            }

            if Instant::now() + interval > deadline {
                tracing::debug!(calls_id = %id, "Gave up waiting for batch");
                return Ok(status);
            }

            sleep(interval).await;
        }
    }
}
