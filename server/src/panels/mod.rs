//! In-memory state behind the two demo panels.
//!
//! Every action first transitions its panel under a write lock, so an action
//! whose button would be disabled is refused before any RPC call is made.

pub mod direct;
pub mod wallet;

use std::{collections::HashMap, fmt, sync::Arc};

use alloy::primitives::Address;
use serde::Serialize;
use tokio::sync::RwLock;

pub use direct::{DirectAction, DirectDelegationPanel};
pub use wallet::WalletBatchPanel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStatus {
    #[default]
    Idle,
    Signing,
    Sending,
    Success,
    Error,
}

impl PanelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelStatus::Idle => "idle",
            PanelStatus::Signing => "signing",
            PanelStatus::Sending => "sending",
            PanelStatus::Success => "success",
            PanelStatus::Error => "error",
        }
    }

    /// A signing or sending chain is running
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PanelStatus::Signing | PanelStatus::Sending)
    }
}

impl fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direct delegation panels, one per EOA
#[derive(Clone, Default)]
pub struct DirectPanels {
    inner: Arc<RwLock<HashMap<Address, DirectDelegationPanel>>>,
}

impl DirectPanels {
    /// Current panel for `eoa`; an untouched EOA gets a fresh idle panel
    pub async fn get(&self, eoa: Address) -> DirectDelegationPanel {
        self.inner
            .read()
            .await
            .get(&eoa)
            .cloned()
            .unwrap_or_else(|| DirectDelegationPanel::new(eoa))
    }

    /// Apply `f` to the panel for `eoa` under the write lock, creating it if needed
    pub async fn update<T>(
        &self,
        eoa: Address,
        f: impl FnOnce(&mut DirectDelegationPanel) -> T,
    ) -> T {
        let mut panels = self.inner.write().await;
        let panel = panels
            .entry(eoa)
            .or_insert_with(|| DirectDelegationPanel::new(eoa));
        f(panel)
    }

    /// Like `update`, but an EOA without a panel gets a throwaway one that is not stored
    pub async fn update_if_present<T>(
        &self,
        eoa: Address,
        f: impl FnOnce(&mut DirectDelegationPanel) -> T,
    ) -> T {
        match self.inner.write().await.get_mut(&eoa) {
            Some(panel) => f(panel),
            None => f(&mut DirectDelegationPanel::new(eoa)),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// The single wallet batch panel
#[derive(Clone, Default)]
pub struct WalletPanelState {
    inner: Arc<RwLock<WalletBatchPanel>>,
}

impl WalletPanelState {
    pub async fn get(&self) -> WalletBatchPanel {
        self.inner.read().await.clone()
    }

    pub async fn update<T>(&self, f: impl FnOnce(&mut WalletBatchPanel) -> T) -> T {
        f(&mut *self.inner.write().await)
    }
}
