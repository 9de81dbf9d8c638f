use std::time::Duration;

use alloy::{
    consensus::{SignableTransaction, Signed, TypedTransaction},
    eips::eip7702::SignedAuthorization,
    network::{ReceiptResponse, TransactionBuilder, TransactionBuilder7702},
    primitives::{Bytes, TxHash, U256},
    providers::{PendingTransactionError, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol,
    sol_types::SolCall,
    transports::RpcError,
};
use demo_core::{
    chain::Chain,
    credentials::SigningCredential,
    error::{AlloyRpcErrorToDemoError, DemoError, is_unsupported_eip1559_error},
    signer::{AccountSigner, EoaSigningOptions},
    transaction::{InnerCall, total_value},
};
use serde::Serialize;

use crate::{constants::GAS_LIMIT_BUFFER_PERCENT, delegated_account::DelegatedAccount};

sol!(
    #[derive(serde::Serialize, serde::Deserialize)]
    struct Call {
        address target;
        uint256 value;
        bytes data;
    }

    function execute(Call[] calldata calls) external payable;
);

impl From<&InnerCall> for Call {
    fn from(call: &InnerCall) -> Self {
        Call {
            target: call.to,
            value: call.value,
            data: call.data.clone(),
        }
    }
}

/// ABI-encode `execute(calls)` for the delegated account
pub fn execute_calldata(calls: &[InnerCall]) -> Bytes {
    executeCall {
        calls: calls.iter().map(Call::from).collect(),
    }
    .abi_encode()
    .into()
}

/// What the chain said about a mined transaction
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            success: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTransaction {
    pub transaction_hash: TxHash,
    pub explorer_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptSummary>,
    /// The transaction went out but waiting for its receipt failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_error: Option<String>,
}

impl SubmittedTransaction {
    /// Mined, and the receipt reports a revert
    pub fn reverted(&self) -> bool {
        self.receipt.as_ref().is_some_and(|receipt| !receipt.success)
    }
}

/// A transaction an EOA sends to its own address: either carrying an
/// authorization (delegate / revoke) or calling its delegated code (batch)
pub struct SelfTransaction<C: Chain> {
    account: DelegatedAccount<C>,
    input: Bytes,
    value: U256,
    authorization: Option<SignedAuthorization>,
}

impl<C: Chain> DelegatedAccount<C> {
    /// Type-4 transaction installing (or, for the zero address, clearing) a delegation
    pub fn authorization_transaction(
        self,
        authorization: SignedAuthorization,
    ) -> SelfTransaction<C> {
        SelfTransaction {
            account: self,
            input: Bytes::new(),
            value: U256::ZERO,
            authorization: Some(authorization),
        }
    }

    /// Call `execute(calls)` on the account itself, funding it with the sum of call values
    pub fn batch_transaction(self, calls: &[InnerCall]) -> Result<SelfTransaction<C>, DemoError> {
        if calls.is_empty() {
            return Err(DemoError::ValidationError {
                message: "A batch needs at least one call".to_string(),
            });
        }

        let value = total_value(calls).ok_or_else(|| DemoError::ValidationError {
            message: "Total value of the batch overflows uint256".to_string(),
        })?;

        Ok(SelfTransaction {
            account: self,
            input: execute_calldata(calls),
            value,
            authorization: None,
        })
    }
}

impl<C: Chain> SelfTransaction<C> {
    pub fn account(&self) -> &DelegatedAccount<C> {
        &self.account
    }

    /// Unfilled request: sender, recipient, payload and authorization list
    pub fn to_request(&self) -> TransactionRequest {
        let eoa = self.account.address();
        let tx_request = TransactionRequest::default()
            .with_from(eoa)
            .with_to(eoa)
            .with_value(self.value)
            .with_input(self.input.clone())
            .with_chain_id(self.account.chain().chain_id());

        match &self.authorization {
            Some(authorization) => tx_request.with_authorization_list(vec![authorization.clone()]),
            None => tx_request,
        }
    }

    async fn estimate_gas_fees(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionRequest, DemoError> {
        let chain = self.account.chain();

        match chain.provider().estimate_eip1559_fees().await {
            Ok(fees) => {
                tracing::debug!(
                    max_fee = fees.max_fee_per_gas,
                    max_priority_fee = fees.max_priority_fee_per_gas,
                    "Using EIP-1559 fees"
                );

                Ok(tx
                    .with_max_fee_per_gas(fees.max_fee_per_gas)
                    .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas))
            }
            Err(eip1559_error) if is_unsupported_eip1559_error(&eip1559_error) => {
                if tx.authorization_list().is_some() {
                    return Err(DemoError::TransactionBuildError {
                        message: "EIP-7702 transactions are not supported on this chain"
                            .to_string(),
                    });
                }

                tracing::debug!("EIP-1559 not supported, falling back to legacy gas price");
                let gas_price = chain
                    .provider()
                    .get_gas_price()
                    .await
                    .map_err(|e| e.to_demo_error(chain))?;
                Ok(tx.with_gas_price(gas_price))
            }
            Err(eip1559_error) => Err(eip1559_error.to_demo_error(chain)),
        }
    }

    async fn estimate_gas_limit(
        &self,
        tx: TransactionRequest,
    ) -> Result<TransactionRequest, DemoError> {
        let chain = self.account.chain();

        match chain.provider().estimate_gas(tx.clone()).await {
            Ok(gas_limit) => {
                Ok(tx.with_gas_limit(gas_limit * (100 + GAS_LIMIT_BUFFER_PERCENT) / 100))
            }
            Err(RpcError::ErrorResp(payload))
                if payload.as_revert_data().is_some()
                    || payload.message.to_lowercase().contains("revert") =>
            {
                let revert = payload
                    .as_revert_data()
                    .map(|data| format!(" (revert: {data})"))
                    .unwrap_or_default();
                Err(DemoError::SimulationFailed {
                    message: format!(
                        "Transaction reverted during gas estimation: {}{revert}",
                        payload.message
                    ),
                })
            }
            Err(e) => Err(e.to_demo_error(chain)),
        }
    }

    /// Fill nonce, fees and gas, then build the typed transaction
    pub async fn build(&self) -> Result<TypedTransaction, DemoError> {
        let nonce = self.account.get_nonce().await?;
        let tx_request = self.to_request().with_nonce(nonce);
        let tx_request = self.estimate_gas_fees(tx_request).await?;
        let tx_request = self.estimate_gas_limit(tx_request).await?;

        tx_request
            .build_typed_tx()
            .map_err(|e| DemoError::TransactionBuildError {
                message: format!("Failed to build typed transaction: {e:?}"),
            })
    }

    pub async fn sign<S: AccountSigner>(
        &self,
        signer: &S,
        credentials: &SigningCredential,
    ) -> Result<Signed<TypedTransaction>, DemoError> {
        let typed_tx = self.build().await?;

        let signing_options = EoaSigningOptions {
            from: self.account.address(),
            chain_id: Some(self.account.chain().chain_id()),
        };

        let signature = signer
            .sign_transaction(signing_options, &typed_tx, credentials)
            .await?;

        Ok(typed_tx.into_signed(signature))
    }

    /// Sign and broadcast; with `receipt_timeout` set, also wait for the receipt.
    ///
    /// Errors only if nothing was broadcast. A failed wait after broadcast is
    /// reported through `receipt_error`.
    pub async fn send<S: AccountSigner>(
        &self,
        signer: &S,
        credentials: &SigningCredential,
        receipt_timeout: Option<Duration>,
    ) -> Result<SubmittedTransaction, DemoError> {
        let chain = self.account.chain();
        let signed_tx = self.sign(signer, credentials).await?;

        let pending = chain
            .provider()
            .send_tx_envelope(signed_tx.into())
            .await
            .map_err(|e| e.to_demo_error(chain))?;

        let transaction_hash = *pending.tx_hash();
        tracing::info!(
            eoa_address = ?self.account.address(),
            transaction_hash = ?transaction_hash,
            delegate = ?self.authorization.as_ref().map(|auth| auth.address),
            value = %self.value,
            "Submitted self transaction"
        );

        let (receipt, receipt_error) = match receipt_timeout {
            Some(timeout) => match pending.with_timeout(Some(timeout)).get_receipt().await {
                Ok(receipt) => (Some(ReceiptSummary::from(&receipt)), None),
                Err(e) => {
                    let error = match e {
                        PendingTransactionError::TransportError(e) => {
                            e.to_demo_error(chain).to_string()
                        }
                        other => format!("Failed to get receipt for {transaction_hash}: {other}"),
                    };
                    tracing::warn!(
                        transaction_hash = ?transaction_hash,
                        error = %error,
                        "Receipt wait failed after broadcast"
                    );
                    (None, Some(error))
                }
            },
            None => (None, None),
        };

        Ok(SubmittedTransaction {
            transaction_hash,
            explorer_url: chain.explorer().tx_url(transaction_hash),
            receipt,
            receipt_error,
        })
    }
}
