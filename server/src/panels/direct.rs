use alloy::primitives::{Address, TxHash};
use demo_core::error::DemoError;
use demo_eip7702_core::transaction::SubmittedTransaction;
use serde::Serialize;

use super::PanelStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectAction {
    Delegate,
    ExecuteBatch,
    Revoke,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectDelegationPanel {
    pub status: PanelStatus,
    pub eoa_address: Address,
    /// A private key has been supplied for this EOA
    pub key_present: bool,
    pub is_delegated: bool,
    pub delegation_tx_hash: Option<TxHash>,
    pub batch_tx_hash: Option<TxHash>,
    pub revoke_tx_hash: Option<TxHash>,
    pub error: Option<String>,
}

impl DirectDelegationPanel {
    pub fn new(eoa_address: Address) -> Self {
        Self {
            status: PanelStatus::Idle,
            eoa_address,
            key_present: false,
            is_delegated: false,
            delegation_tx_hash: None,
            batch_tx_hash: None,
            revoke_tx_hash: None,
            error: None,
        }
    }

    pub fn can_delegate(&self) -> bool {
        self.key_present && !self.status.is_in_flight()
    }

    pub fn can_revoke(&self) -> bool {
        self.key_present && !self.status.is_in_flight()
    }

    pub fn can_execute_batch(&self) -> bool {
        self.is_delegated && self.status != PanelStatus::Sending
    }

    /// The EOA is always known once a panel exists for it
    pub fn can_check_delegation(&self) -> bool {
        true
    }

    pub fn delegate_label(&self) -> &'static str {
        match self.status {
            PanelStatus::Signing => "Signing authorization...",
            PanelStatus::Sending => "Sending tx...",
            _ => "1. Delegate to BatchCallDelegation",
        }
    }

    /// Start `action`, or refuse it when its button would be disabled.
    ///
    /// Only one signing/sending chain runs per EOA: a batch is also refused
    /// while an authorization is being signed.
    pub fn begin(&mut self, action: DirectAction) -> Result<(), DemoError> {
        self.key_present = true;

        let busy = || DemoError::PanelBusy {
            status: self.status.to_string(),
        };

        match action {
            DirectAction::Delegate if !self.can_delegate() => return Err(busy()),
            DirectAction::Revoke if !self.can_revoke() => return Err(busy()),
            DirectAction::ExecuteBatch if !self.is_delegated => {
                return Err(DemoError::NotDelegated {
                    eoa_address: self.eoa_address,
                });
            }
            DirectAction::ExecuteBatch if self.status.is_in_flight() => return Err(busy()),
            _ => {}
        }

        self.error = None;
        match action {
            DirectAction::Delegate => {
                self.delegation_tx_hash = None;
                self.status = PanelStatus::Signing;
            }
            DirectAction::Revoke => {
                self.revoke_tx_hash = None;
                self.status = PanelStatus::Signing;
            }
            DirectAction::ExecuteBatch => {
                self.batch_tx_hash = None;
                self.status = PanelStatus::Sending;
            }
        }

        Ok(())
    }

    /// The authorization is signed; the carrying transaction goes out next
    pub fn authorization_signed(&mut self) {
        self.status = PanelStatus::Sending;
    }

    /// Record the broadcast transaction. Its hash is kept even when the
    /// receipt reports a revert; that leaves the panel in error and the
    /// delegation flag untouched.
    pub fn complete(
        &mut self,
        action: DirectAction,
        transaction: &SubmittedTransaction,
    ) -> Result<(), DemoError> {
        let tx_hash = transaction.transaction_hash;
        match action {
            DirectAction::Delegate => self.delegation_tx_hash = Some(tx_hash),
            DirectAction::Revoke => self.revoke_tx_hash = Some(tx_hash),
            DirectAction::ExecuteBatch => self.batch_tx_hash = Some(tx_hash),
        }

        if transaction.reverted() {
            let error = DemoError::TransactionReverted {
                transaction_hash: tx_hash,
            };
            self.fail(&error);
            return Err(error);
        }

        match action {
            DirectAction::Delegate => self.is_delegated = true,
            DirectAction::Revoke => self.is_delegated = false,
            DirectAction::ExecuteBatch => {}
        }
        self.status = PanelStatus::Success;
        Ok(())
    }

    pub fn fail(&mut self, error: &DemoError) {
        self.error = Some(error.to_string());
        self.status = PanelStatus::Error;
    }

    /// Result of an on-chain delegation check
    pub fn observe_delegation(&mut self, delegated: bool) {
        self.is_delegated = delegated;
    }

    pub fn view(&self, explorer: &demo_core::chain::Explorer) -> DirectPanelView {
        let tx = |hash: Option<TxHash>| {
            hash.map(|hash| TransactionLink {
                hash,
                url: explorer.tx_url(hash),
            })
        };

        DirectPanelView {
            status: self.status,
            eoa_address: self.eoa_address,
            eoa_url: explorer.address_url(self.eoa_address),
            is_delegated: self.is_delegated,
            delegation_tx: tx(self.delegation_tx_hash),
            batch_tx: tx(self.batch_tx_hash),
            revoke_tx: tx(self.revoke_tx_hash),
            error: self.error.clone(),
            actions: DirectActions {
                delegate: self.can_delegate(),
                execute_batch: self.can_execute_batch(),
                revoke: self.can_revoke(),
                check_delegation: self.can_check_delegation(),
                delegate_label: self.delegate_label(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionLink {
    pub hash: TxHash,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectActions {
    pub delegate: bool,
    pub execute_batch: bool,
    pub revoke: bool,
    pub check_delegation: bool,
    pub delegate_label: &'static str,
}

/// What the panel shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPanelView {
    pub status: PanelStatus,
    pub eoa_address: Address,
    pub eoa_url: String,
    pub is_delegated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_tx: Option<TransactionLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_tx: Option<TransactionLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoke_tx: Option<TransactionLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub actions: DirectActions,
}
