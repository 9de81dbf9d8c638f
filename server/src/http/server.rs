use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;
use axum::{
    Router,
    routing::{get, post},
};
use demo_core::signer::EoaSigner;
use demo_eip7702_core::wallet_calls::WalletBatchCalls;
use tokio::{sync::watch, task::JoinHandle};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    chains::DemoChainService,
    panels::{DirectPanels, WalletPanelState},
};

use super::routes::{direct_delegation, overview, wallet_calls};

/// Values from configuration the handlers need
#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub network_name: String,
    pub delegation_contract: Address,
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

#[derive(Clone)]
pub struct DemoServerState {
    pub chains: Arc<DemoChainService>,
    pub eoa_signer: Arc<EoaSigner>,
    /// `None` when no wallet endpoint is configured
    pub wallet: Option<Arc<WalletBatchCalls>>,
    pub direct_panels: DirectPanels,
    pub wallet_panel: WalletPanelState,
    pub settings: Arc<DemoSettings>,
}

pub struct DemoServer {
    handle: Option<JoinHandle<Result<(), std::io::Error>>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    app: Router,
}

pub fn router(state: DemoServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(overview::page_overview))
        .route("/health", get(overview::health))
        .route("/v1/direct/delegate", post(direct_delegation::delegate))
        .route("/v1/direct/batch", post(direct_delegation::execute_batch))
        .route("/v1/direct/revoke", post(direct_delegation::revoke))
        .route("/v1/direct/{address}", get(direct_delegation::panel))
        .route(
            "/v1/direct/{address}/delegation",
            get(direct_delegation::check_delegation),
        )
        .route("/v1/wallet/account", get(wallet_calls::connected_account))
        .route("/v1/wallet/capabilities", get(wallet_calls::capabilities))
        .route("/v1/wallet/calls", post(wallet_calls::send_batch))
        .route("/v1/wallet/calls/{id}", get(wallet_calls::calls_status))
        .route("/v1/wallet/panel", get(wallet_calls::panel))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl DemoServer {
    pub fn new(state: DemoServerState) -> Self {
        Self {
            handle: None,
            shutdown_tx: None,
            app: router(state),
        }
    }

    pub fn start(&mut self, listener: tokio::net::TcpListener) -> Result<(), std::io::Error> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let app = self.app.clone();
        let local_addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            tracing::info!(%local_addr, "HTTP server starting");

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let mut rx = shutdown_rx;
                    while !*rx.borrow() {
                        if rx.changed().await.is_err() {
                            break;
                        }
                    }
                    tracing::info!("HTTP server shutting down");
                })
                .await
        });

        self.handle = Some(handle);
        self.shutdown_tx = Some(shutdown_tx);

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), std::io::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(true).is_err() {
                tracing::error!("Failed to send shutdown signal to HTTP server");
            }
        }

        if let Some(handle) = self.handle.take() {
            match handle.await {
                Ok(result) => {
                    if let Err(e) = result {
                        tracing::error!("HTTP server error during shutdown: {}", e);
                        return Err(e);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to join HTTP server task: {}", e);
                    return Err(std::io::Error::other(format!("Task join error: {e}")));
                }
            }
        }

        Ok(())
    }
}
