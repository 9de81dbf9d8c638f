use alloy::{
    primitives::{Address, TxHash},
    transports::{
        RpcError as AlloyRpcError, TransportErrorKind, http::reqwest::header::InvalidHeaderValue,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::Chain;

/// Marker a wallet puts in its error when the EOA is delegated to code it does not recognise
const UNSUPPORTED_CONTRACT_MARKER: &str = "unsupported contract";

const REVOKE_HINT: &str = "This means the EOA was previously delegated to a contract the wallet doesn't recognize. Use the Revoke Delegation action of the direct delegation panel to clear it, or use a different account.";

#[derive(Debug, Error, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorKind {
    /// Server returned an error response.
    #[error("server returned an error response: {}", .0.as_display())]
    ErrorResp(RpcErrorResponse),

    /// Server returned a null response when a non-null response was expected.
    #[error("server returned a null response when a non-null response was expected")]
    NullResp,

    /// Rpc server returned an unsupported feature.
    #[error("unsupported feature: {message}")]
    UnsupportedFeature { message: String },

    /// Returned when a local pre-processing step fails.
    #[error("local usage error: {message}")]
    InternalError { message: String },

    /// JSON serialization error.
    #[error("serialization error: {message}")]
    SerError { message: String },

    /// JSON deserialization error.
    #[error("deserialization error: {message}, text: {text}")]
    DeserError { message: String, text: String },

    #[error("HTTP error {status}")]
    TransportHttpError { status: u16, body: String },

    #[error("Other transport error: {message}")]
    OtherTransportError { message: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcErrorResponse {
    /// The error code.
    pub code: i64,
    /// The error message (if any).
    pub message: String,
    /// The error data (if any).
    pub data: Option<String>,
}

impl RpcErrorResponse {
    pub fn as_display(&self) -> String {
        format!(
            "code {}: {}{}",
            self.code,
            self.message,
            self.data
                .as_ref()
                .map(|data| format!(", data: {data}"))
                .unwrap_or_default()
        )
    }
}

#[derive(Error, Debug, Serialize, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum DemoError {
    #[error("RPC error on chain {chain_id} at {rpc_url}: {message}")]
    RpcError {
        chain_id: u64,
        rpc_url: String,
        message: String,
        kind: RpcErrorKind,
    },

    #[error("Wallet error at {wallet_url}: {message}")]
    WalletError {
        wallet_url: String,
        message: String,
        kind: RpcErrorKind,
    },

    #[error("Bad RPC configuration: {message}")]
    RpcConfigError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Signing error: {message}")]
    SigningError { message: String },

    #[error("Failed to build transaction: {message}")]
    TransactionBuildError { message: String },

    #[error("Transaction simulation failed: {message}")]
    SimulationFailed { message: String },

    #[error("Transaction {transaction_hash} was mined but reverted")]
    #[serde(rename_all = "camelCase")]
    TransactionReverted { transaction_hash: TxHash },

    #[error("Account {eoa_address} is not delegated")]
    #[serde(rename_all = "camelCase")]
    NotDelegated { eoa_address: Address },

    #[error("Another action is in progress (status: {status})")]
    PanelBusy { status: String },

    #[error("No ERC-5792 wallet endpoint is configured")]
    WalletNotConfigured,

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl DemoError {
    /// Follow-up advice for errors a user can act on
    pub fn hint(&self) -> Option<&'static str> {
        self.to_string()
            .contains(UNSUPPORTED_CONTRACT_MARKER)
            .then_some(REVOKE_HINT)
    }
}

impl From<InvalidHeaderValue> for DemoError {
    fn from(err: InvalidHeaderValue) -> Self {
        DemoError::ValidationError {
            message: err.to_string(),
        }
    }
}

pub trait AlloyRpcErrorToDemoError {
    fn to_demo_error(&self, chain: &impl Chain) -> DemoError;
    fn to_wallet_error(&self, wallet_url: &str) -> DemoError;
}

fn to_demo_rpc_error_kind(err: &AlloyRpcError<TransportErrorKind>) -> RpcErrorKind {
    match err {
        AlloyRpcError::ErrorResp(err) => RpcErrorKind::ErrorResp(RpcErrorResponse {
            code: err.code,
            message: err.message.to_string(),
            data: err.data.as_ref().map(|data| data.to_string()),
        }),
        AlloyRpcError::NullResp => RpcErrorKind::NullResp,
        AlloyRpcError::UnsupportedFeature(feature) => RpcErrorKind::UnsupportedFeature {
            message: feature.to_string(),
        },
        AlloyRpcError::LocalUsageError(err) => RpcErrorKind::InternalError {
            message: err.to_string(),
        },
        AlloyRpcError::SerError(err) => RpcErrorKind::SerError {
            message: err.to_string(),
        },
        AlloyRpcError::DeserError { err, text } => RpcErrorKind::DeserError {
            message: err.to_string(),
            text: text.to_string(),
        },
        AlloyRpcError::Transport(err) => match err {
            TransportErrorKind::HttpError(err) => RpcErrorKind::TransportHttpError {
                status: err.status,
                body: err.body.to_string(),
            },
            _ => RpcErrorKind::OtherTransportError {
                message: err.to_string(),
            },
        },
    }
}

impl AlloyRpcErrorToDemoError for AlloyRpcError<TransportErrorKind> {
    fn to_demo_error(&self, chain: &impl Chain) -> DemoError {
        DemoError::RpcError {
            chain_id: chain.chain_id(),
            rpc_url: chain.rpc_url().to_string(),
            message: self.to_string(),
            kind: to_demo_rpc_error_kind(self),
        }
    }

    fn to_wallet_error(&self, wallet_url: &str) -> DemoError {
        DemoError::WalletError {
            wallet_url: wallet_url.to_string(),
            message: self.to_string(),
            kind: to_demo_rpc_error_kind(self),
        }
    }
}

/// Whether the node lacks EIP-1559 fee estimation
pub fn is_unsupported_eip1559_error(error: &AlloyRpcError<TransportErrorKind>) -> bool {
    if let AlloyRpcError::UnsupportedFeature(_) = error {
        return true;
    }

    if let AlloyRpcError::ErrorResp(resp) = error {
        let message = resp.message.to_lowercase();
        return message.contains("method not found");
    }

    false
}
