use alloy::primitives::Address;
use axum::{Json, extract::State, response::IntoResponse};
use demo_core::chain::Chain;
use serde::Serialize;

use crate::http::{server::DemoServerState, types::SuccessResponse};

pub const PAGE_TITLE: &str = "EIP-7702 Demo";

pub const PAGE_DESCRIPTION: &str = "This app demonstrates triggering an EIP-7702 contract upgrade. An EOA can delegate to a smart contract, gaining capabilities like batch execution, all without migrating to a new address.";

pub const HOW_IT_WORKS: [&str; 4] = [
    "The EOA signs an authorization designating a smart contract address",
    "A Type 4 transaction includes this authorization in its authorizationList",
    "The EOA now has a delegation indicator pointing to that contract's code",
    "Any call to the EOA executes the delegated contract's logic (e.g. batch calls)",
];

pub const TESTNET_WARNING: &str = "Only use a testnet key with testnet ETH. Never enter a mainnet private key.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
}

#[derive(Debug, Serialize)]
pub struct ContractLink {
    pub name: &'static str,
    pub address: Address,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverview {
    pub title: &'static str,
    pub description: &'static str,
    pub how_it_works: [&'static str; 4],
    pub network: NetworkInfo,
    pub delegation_contract: ContractLink,
    pub warning: &'static str,
    pub wallet_panel_enabled: bool,
}

/// Page shell: what the demo is and where it runs
pub async fn page_overview(State(state): State<DemoServerState>) -> impl IntoResponse {
    let chain = state.chains.default_chain();
    let contract = state.settings.delegation_contract;

    Json(SuccessResponse::new(PageOverview {
        title: PAGE_TITLE,
        description: PAGE_DESCRIPTION,
        how_it_works: HOW_IT_WORKS,
        network: NetworkInfo {
            name: state.settings.network_name.clone(),
            chain_id: chain.chain_id(),
        },
        delegation_contract: ContractLink {
            name: "BatchCallDelegation",
            address: contract,
            url: chain.explorer().address_url(contract),
        },
        warning: TESTNET_WARNING,
        wallet_panel_enabled: state.wallet.is_some(),
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(SuccessResponse::new("ok"))
}
