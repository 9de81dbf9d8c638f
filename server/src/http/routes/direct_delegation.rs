use alloy::primitives::Address;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use demo_core::{
    chain::{Chain, ChainService},
    credentials::SigningCredential,
    error::DemoError,
    transaction::{InnerCall, demo_calls},
};
use demo_eip7702_core::{
    constants::REVOKE_DELEGATION_ADDRESS,
    delegated_account::{DelegatedAccount, DelegationStatus},
    transaction::SubmittedTransaction,
};
use serde::{Deserialize, Serialize};

use crate::{
    http::{
        error::{ApiDemoError, DemoResult},
        extractors::DemoJson,
        server::DemoServerState,
        types::SuccessResponse,
    },
    panels::{DirectAction, direct::DirectPanelView},
};

use super::run_detached;

// ===== REQUEST/RESPONSE TYPES =====

/// Body of the delegate, batch and revoke actions
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectActionRequest {
    /// Hex private key of the EOA, `0x` optional. Testnet keys only.
    pub private_key: String,
    /// Talk to this RPC endpoint instead of the configured one
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub wait_for_receipt: bool,
    /// Batch action only; defaults to the demo transfers
    #[serde(default)]
    pub calls: Option<Vec<InnerCall>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectActionResponse {
    pub transaction: SubmittedTransaction,
    pub panel: DirectPanelView,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationQuery {
    #[serde(default)]
    pub rpc_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationCheckResponse {
    pub eoa_address: Address,
    #[serde(flatten)]
    pub status: DelegationStatus,
    /// Delegated to the configured demo contract specifically
    pub delegated_to_demo_contract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub panel: DirectPanelView,
}

// ===== ROUTE HANDLERS =====

/// Sign an authorization for the demo contract and send it in a type-4 transaction
pub async fn delegate(
    State(state): State<DemoServerState>,
    DemoJson(request): DemoJson<DirectActionRequest>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let contract = state.settings.delegation_contract;
    run_detached(authorize(state, request, DirectAction::Delegate, contract)).await
}

/// Clear the delegation by authorizing the zero address
pub async fn revoke(
    State(state): State<DemoServerState>,
    DemoJson(request): DemoJson<DirectActionRequest>,
) -> Result<impl IntoResponse, ApiDemoError> {
    run_detached(authorize(
        state,
        request,
        DirectAction::Revoke,
        REVOKE_DELEGATION_ADDRESS,
    ))
    .await
}

/// Call `execute(calls)` on the delegated EOA
pub async fn execute_batch(
    State(state): State<DemoServerState>,
    DemoJson(request): DemoJson<DirectActionRequest>,
) -> Result<impl IntoResponse, ApiDemoError> {
    run_detached(batch(state, request)).await
}

/// Panel snapshot for an EOA
pub async fn panel(
    State(state): State<DemoServerState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let eoa = parse_address(&address).api_error()?;
    let explorer = state.chains.default_chain().explorer();
    let view = state.direct_panels.get(eoa).await.view(explorer);

    Ok(Json(SuccessResponse::new(view)))
}

/// Read the EOA's code and report its delegation
pub async fn check_delegation(
    State(state): State<DemoServerState>,
    Path(address): Path<String>,
    Query(query): Query<DelegationQuery>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let eoa = parse_address(&address).api_error()?;
    let chain = state
        .chains
        .get_chain(query.rpc_url.as_deref())
        .api_error()?;
    let explorer = chain.explorer().clone();

    let status = DelegatedAccount::new(eoa, chain)
        .delegation_status()
        .await
        .api_error()?;

    let panel = state
        .direct_panels
        .update_if_present(eoa, |panel| {
            panel.observe_delegation(status.delegated);
            panel.view(&explorer)
        })
        .await;

    Ok(Json(SuccessResponse::new(DelegationCheckResponse {
        eoa_address: eoa,
        status,
        delegated_to_demo_contract: status
            .is_delegated_to(Some(state.settings.delegation_contract)),
        target_url: status.target.map(|target| explorer.address_url(target)),
        panel,
    })))
}

// ===== HELPER FUNCTIONS =====

fn parse_address(raw: &str) -> Result<Address, DemoError> {
    raw.trim()
        .parse()
        .map_err(|e| DemoError::ValidationError {
            message: format!("Invalid address {raw:?}: {e}"),
        })
}

fn receipt_timeout(state: &DemoServerState, wait: bool) -> Option<std::time::Duration> {
    wait.then_some(state.settings.receipt_timeout)
}

/// Delegate and revoke: sign, then send the authorization from the EOA itself
async fn authorize(
    state: DemoServerState,
    request: DirectActionRequest,
    action: DirectAction,
    contract: Address,
) -> Result<Json<SuccessResponse<DirectActionResponse>>, ApiDemoError> {
    let credentials = SigningCredential::from_private_key(&request.private_key).api_error()?;
    let eoa = credentials.address();
    let chain = state
        .chains
        .get_chain(request.rpc_url.as_deref())
        .api_error()?;

    state
        .direct_panels
        .update(eoa, |panel| panel.begin(action))
        .await
        .api_error()?;

    tracing::info!(eoa_address = ?eoa, delegate = ?contract, ?action, "Signing authorization");

    let account = DelegatedAccount::new(eoa, chain);
    let signer = state.eoa_signer.as_ref();

    let result = async {
        let authorization = account
            .sign_authorization(signer, &credentials, contract)
            .await?;

        state
            .direct_panels
            .update(eoa, |panel| panel.authorization_signed())
            .await;

        account
            .authorization_transaction(authorization)
            .send(
                signer,
                &credentials,
                receipt_timeout(&state, request.wait_for_receipt),
            )
            .await
    }
    .await;

    finish(&state, eoa, action, result).await
}

async fn batch(
    state: DemoServerState,
    request: DirectActionRequest,
) -> Result<Json<SuccessResponse<DirectActionResponse>>, ApiDemoError> {
    let credentials = SigningCredential::from_private_key(&request.private_key).api_error()?;
    let eoa = credentials.address();
    let chain = state
        .chains
        .get_chain(request.rpc_url.as_deref())
        .api_error()?;

    let calls = request.calls.unwrap_or_else(demo_calls);
    let transaction = DelegatedAccount::new(eoa, chain)
        .batch_transaction(&calls)
        .api_error()?;

    // A delegation sent from this panel counts before it is mined
    if !state.direct_panels.get(eoa).await.is_delegated {
        let delegated = transaction.account().is_delegated_to(None).await.api_error()?;
        state
            .direct_panels
            .update(eoa, |panel| panel.observe_delegation(delegated))
            .await;
    }

    state
        .direct_panels
        .update(eoa, |panel| panel.begin(DirectAction::ExecuteBatch))
        .await
        .api_error()?;

    tracing::info!(eoa_address = ?eoa, calls = calls.len(), "Executing batch");

    let result = transaction
        .send(
            state.eoa_signer.as_ref(),
            &credentials,
            receipt_timeout(&state, request.wait_for_receipt),
        )
        .await;

    finish(&state, eoa, DirectAction::ExecuteBatch, result).await
}

async fn finish(
    state: &DemoServerState,
    eoa: Address,
    action: DirectAction,
    result: Result<SubmittedTransaction, DemoError>,
) -> Result<Json<SuccessResponse<DirectActionResponse>>, ApiDemoError> {
    let explorer = state.chains.default_chain().explorer();

    let result = match result {
        Ok(transaction) => state
            .direct_panels
            .update(eoa, |panel| {
                panel
                    .complete(action, &transaction)
                    .map(|()| panel.view(explorer))
            })
            .await
            .map(|panel| (transaction, panel)),
        Err(error) => {
            state
                .direct_panels
                .update(eoa, |panel| panel.fail(&error))
                .await;
            Err(error)
        }
    };

    match result {
        Ok((transaction, panel)) => Ok(Json(SuccessResponse::new(DirectActionResponse {
            transaction,
            panel,
        }))),
        Err(error) => {
            tracing::warn!(eoa_address = ?eoa, ?action, error = %error, "Direct delegation action failed");
            Err(ApiDemoError(error))
        }
    }
}
