use std::collections::HashMap;

use alloy::{
    primitives::{Address, B256, Bytes, U64, U256},
    rpc::client::RpcClient,
    transports::{TransportResult, http::reqwest::Url},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::transport::HeaderInjectingTransport;
use crate::transaction::InnerCall;

/// ERC-5792 request version sent with `wallet_sendCalls`
pub const SEND_CALLS_VERSION: &str = "2.0.0";

/// A JSON-RPC client for a wallet exposing the ERC-5792 `wallet_*` namespace
#[derive(Debug, Clone)]
pub struct WalletClient {
    inner: RpcClient,
    url: Url,
}

/// Capabilities a wallet reports for one chain, keyed by capability name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainCapabilities(pub serde_json::Map<String, Value>);

impl ChainCapabilities {
    /// Whether the wallet can execute a batch atomically on this chain.
    ///
    /// Understands the early `atomicBatch: { supported }` shape as well as the
    /// current `atomic: { status }` one, where `ready` means the wallet will
    /// upgrade the account (for example through EIP-7702) on first use.
    pub fn supports_atomic_batch(&self) -> bool {
        let legacy = self
            .0
            .get("atomicBatch")
            .and_then(|cap| cap.get("supported"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let current = self
            .0
            .get("atomic")
            .and_then(|cap| cap.get("status"))
            .and_then(Value::as_str)
            .is_some_and(|status| matches!(status, "supported" | "ready"));

        legacy || current
    }
}

/// `wallet_getCapabilities` result: chain id (hex quantity) to capabilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletCapabilities(pub HashMap<String, ChainCapabilities>);

impl WalletCapabilities {
    pub fn for_chain(&self, chain_id: u64) -> Option<&ChainCapabilities> {
        self.0
            .iter()
            .find(|(key, _)| parse_chain_key(key) == Some(chain_id))
            .map(|(_, caps)| caps)
    }
}

fn parse_chain_key(key: &str) -> Option<u64> {
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCall {
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl From<&InnerCall> for WalletCall {
    fn from(call: &InnerCall) -> Self {
        Self {
            to: call.to,
            value: (!call.value.is_zero()).then_some(call.value),
            data: (!call.data.is_empty()).then(|| call.data.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCallsRequest {
    pub version: String,
    pub chain_id: U64,
    pub from: Address,
    pub atomic_required: bool,
    pub calls: Vec<WalletCall>,
    #[serde(default)]
    pub capabilities: serde_json::Map<String, Value>,
}

impl SendCallsRequest {
    pub fn atomic(chain_id: u64, from: Address, calls: &[InnerCall]) -> Self {
        Self {
            version: SEND_CALLS_VERSION.to_string(),
            chain_id: U64::from(chain_id),
            from,
            atomic_required: true,
            calls: calls.iter().map(WalletCall::from).collect(),
            capabilities: serde_json::Map::new(),
        }
    }
}

/// Early wallets answer `wallet_sendCalls` with a bare identifier
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum SendCallsResponse {
    Id(String),
    Object {
        id: String,
        #[serde(default)]
        #[allow(dead_code)]
        capabilities: Option<Value>,
    },
}

impl SendCallsResponse {
    fn into_id(self) -> String {
        match self {
            SendCallsResponse::Id(id) | SendCallsResponse::Object { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallsStatus {
    Pending,
    Success,
    Failure,
}

impl CallsStatus {
    /// Map an ERC-5792 status code: 1xx pending, 2xx confirmed, anything else failed
    pub fn from_code(code: u64) -> Self {
        match code {
            100..=199 => CallsStatus::Pending,
            200..=299 => CallsStatus::Success,
            _ => CallsStatus::Failure,
        }
    }

    pub fn is_final(self) -> bool {
        !matches!(self, CallsStatus::Pending)
    }
}

impl<'de> Deserialize<'de> for CallsStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Label(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Ok(CallsStatus::from_code(code)),
            Raw::Label(label) => match label.to_ascii_lowercase().as_str() {
                "pending" => Ok(CallsStatus::Pending),
                "confirmed" | "success" => Ok(CallsStatus::Success),
                "failure" | "failed" | "reverted" => Ok(CallsStatus::Failure),
                other => Err(serde::de::Error::custom(format!(
                    "unknown calls status {other:?}"
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReceipt {
    pub transaction_hash: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
    pub status: CallsStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic: Option<bool>,
    #[serde(default)]
    pub receipts: Vec<CallReceipt>,
}

impl CallsStatusResponse {
    pub fn first_transaction_hash(&self) -> Option<B256> {
        self.receipts.first().map(|receipt| receipt.transaction_hash)
    }
}

impl WalletClient {
    pub fn new(transport: HeaderInjectingTransport) -> Self {
        let url = transport.url().clone();
        let client = RpcClient::builder().transport(transport, false);

        Self { inner: client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn accounts(&self) -> TransportResult<Vec<Address>> {
        self.inner.request_noparams("eth_accounts").await
    }

    pub async fn chain_id(&self) -> TransportResult<u64> {
        let chain_id: U64 = self.inner.request_noparams("eth_chainId").await?;
        Ok(chain_id.to::<u64>())
    }

    pub async fn get_capabilities(&self, account: Address) -> TransportResult<WalletCapabilities> {
        self.inner
            .request("wallet_getCapabilities", (account,))
            .await
    }

    /// Hand a batch to the wallet; returns the identifier to poll status with
    pub async fn send_calls(&self, request: &SendCallsRequest) -> TransportResult<String> {
        let response: SendCallsResponse =
            self.inner.request("wallet_sendCalls", [request]).await?;

        Ok(response.into_id())
    }

    pub async fn get_calls_status(&self, id: &str) -> TransportResult<CallsStatusResponse> {
        self.inner.request("wallet_getCallsStatus", [id]).await
    }
}
