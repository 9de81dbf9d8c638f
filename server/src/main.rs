use std::sync::Arc;

use demo_core::{rpc_clients::transport::SharedClientTransportBuilder, signer::EoaSigner};
use demo_eip7702_core::wallet_calls::WalletBatchCalls;
use eip7702_demo::{
    chains::DemoChainService,
    config,
    http::server::{DemoServer, DemoServerState, DemoSettings},
    panels::{DirectPanels, WalletPanelState},
};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::get_config()?;

    let subscriber = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "eip7702_demo=debug,demo_eip7702_core=debug,demo_core=debug,tower_http=debug".into()
        }),
    );

    match config.server.log_format {
        config::LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        config::LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    let transport_builder = SharedClientTransportBuilder::with_new_client()?;
    let chains = Arc::new(DemoChainService::new(&config.network, transport_builder)?);
    tracing::info!(
        chain_id = config.network.chain_id,
        network = %config.network.name,
        "Chain service initialized"
    );

    let wallet = chains
        .wallet_client(&config.wallet)?
        .map(|client| Arc::new(WalletBatchCalls::new(client, config.wallet.account)));
    match &wallet {
        Some(wallet) => tracing::info!(wallet_url = %wallet.client().url(), "Wallet client initialized"),
        None => tracing::info!("No wallet endpoint configured, wallet panel disabled"),
    }

    let mut server = DemoServer::new(DemoServerState {
        chains,
        eoa_signer: Arc::new(EoaSigner::new()),
        wallet,
        direct_panels: DirectPanels::default(),
        wallet_panel: WalletPanelState::default(),
        settings: Arc::new(DemoSettings {
            network_name: config.network.name.clone(),
            delegation_contract: config.delegation.contract,
            receipt_timeout: config.delegation.receipt_timeout,
            poll_interval: config.wallet.poll_interval,
            poll_timeout: config.wallet.poll_timeout,
        }),
    });

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    server.start(listener)?;

    tracing::info!("Server started, waiting for shutdown signal");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
    }
    tracing::info!("Shutdown signal received");

    if let Err(e) = server.shutdown().await {
        tracing::error!("Error during shutdown: {}", e);
    } else {
        tracing::info!("Server shut down successfully");
    }

    Ok(())
}
