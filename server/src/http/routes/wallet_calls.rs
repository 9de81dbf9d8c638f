use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use demo_core::{
    chain::Chain,
    error::DemoError,
    rpc_clients::wallet::CallsStatusResponse,
    transaction::{InnerCall, demo_calls},
};
use demo_eip7702_core::wallet_calls::{BatchSupport, ConnectedAccount, WalletBatchCalls};
use serde::{Deserialize, Serialize};

use crate::{
    http::{
        error::{ApiDemoError, DemoResult},
        extractors::DemoJson,
        server::DemoServerState,
        types::SuccessResponse,
    },
    panels::wallet::WalletPanelView,
};

use super::run_detached;

// ===== REQUEST/RESPONSE TYPES =====

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(flatten)]
    pub account: ConnectedAccount,
    pub address_url: String,
    /// The wallet sits on a different chain than the demo network
    pub chain_mismatch: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesResponse {
    pub account: ConnectedAccount,
    pub support: BatchSupport,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SendBatchRequest {
    /// Defaults to the demo transfers
    pub calls: Option<Vec<InnerCall>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBatchResponse {
    pub calls_id: String,
    pub panel: WalletPanelView,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    /// Poll until the batch settles instead of returning the current status
    #[serde(default)]
    pub wait: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsStatusResult {
    #[serde(flatten)]
    pub status: CallsStatusResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_url: Option<String>,
    pub panel: WalletPanelView,
}

// ===== ROUTE HANDLERS =====

pub async fn connected_account(
    State(state): State<DemoServerState>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let wallet = wallet(&state).api_error()?;
    let account = wallet.connected_account().await.api_error()?;
    let chain = state.chains.default_chain();

    Ok(Json(SuccessResponse::new(AccountResponse {
        address_url: chain.explorer().address_url(account.address),
        chain_mismatch: account.chain_id != chain.chain_id(),
        account,
    })))
}

/// Ask the wallet whether it can batch atomically on its current chain
pub async fn capabilities(
    State(state): State<DemoServerState>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let wallet = wallet(&state).api_error()?;
    let account = wallet.connected_account().await.api_error()?;
    let support = wallet.detect_batch_support(&account).await;

    Ok(Json(SuccessResponse::new(CapabilitiesResponse {
        account,
        support,
    })))
}

/// Hand the batch to the wallet via `wallet_sendCalls`
pub async fn send_batch(
    State(state): State<DemoServerState>,
    DemoJson(request): DemoJson<SendBatchRequest>,
) -> Result<impl IntoResponse, ApiDemoError> {
    run_detached(send(state, request)).await
}

pub async fn calls_status(
    State(state): State<DemoServerState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiDemoError> {
    let wallet = wallet(&state).api_error()?;

    let result = if query.wait {
        wallet
            .wait_for_calls_status(
                &id,
                state.settings.poll_interval,
                state.settings.poll_timeout,
            )
            .await
    } else {
        wallet.calls_status(&id).await
    };
    let status = result.api_error()?;

    let explorer = state.chains.default_chain().explorer();
    let panel = state
        .wallet_panel
        .update(|panel| {
            panel.observe_status(&id, &status);
            panel.view(explorer)
        })
        .await;

    Ok(Json(SuccessResponse::new(CallsStatusResult {
        transaction_url: status
            .first_transaction_hash()
            .map(|hash| explorer.tx_url(hash)),
        status,
        panel,
    })))
}

pub async fn panel(State(state): State<DemoServerState>) -> impl IntoResponse {
    let explorer = state.chains.default_chain().explorer();
    Json(SuccessResponse::new(
        state.wallet_panel.get().await.view(explorer),
    ))
}

// ===== HELPER FUNCTIONS =====

async fn send(
    state: DemoServerState,
    request: SendBatchRequest,
) -> Result<Json<SuccessResponse<SendBatchResponse>>, ApiDemoError> {
    let wallet = wallet(&state).api_error()?;
    let calls = request.calls.unwrap_or_else(demo_calls);

    state
        .wallet_panel
        .update(|panel| panel.begin_send())
        .await
        .api_error()?;

    let result = async {
        let account = wallet.connected_account().await?;
        wallet.send_batch(&account, &calls).await
    }
    .await;

    let explorer = state.chains.default_chain().explorer();
    match result {
        Ok(calls_id) => {
            let panel = state
                .wallet_panel
                .update(|panel| {
                    panel.sent(calls_id.clone());
                    panel.view(explorer)
                })
                .await;

            Ok(Json(SuccessResponse::new(SendBatchResponse {
                calls_id,
                panel,
            })))
        }
        Err(error) => {
            tracing::warn!(error = %error, "wallet_sendCalls failed");
            state.wallet_panel.update(|panel| panel.fail(&error)).await;
            Err(ApiDemoError(error))
        }
    }
}

fn wallet(state: &DemoServerState) -> Result<&WalletBatchCalls, DemoError> {
    state
        .wallet
        .as_deref()
        .ok_or(DemoError::WalletNotConfigured)
}
