use alloy::primitives::B256;
use demo_core::{
    error::DemoError,
    rpc_clients::wallet::{CallsStatus, CallsStatusResponse},
};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletBatchPanel {
    /// `wallet_sendCalls` is awaiting the wallet's answer
    pub is_pending: bool,
    pub calls_id: Option<String>,
    pub calls_status: Option<CallsStatus>,
    pub transaction_hash: Option<B256>,
    pub error: Option<String>,
    pub hint: Option<&'static str>,
}

impl WalletBatchPanel {
    pub fn can_send(&self) -> bool {
        !self.is_pending
    }

    pub fn send_label(&self) -> &'static str {
        if self.is_pending {
            "Waiting for wallet..."
        } else {
            "Send Batch Calls"
        }
    }

    pub fn begin_send(&mut self) -> Result<(), DemoError> {
        if !self.can_send() {
            return Err(DemoError::PanelBusy {
                status: "pending".to_string(),
            });
        }

        *self = Self {
            is_pending: true,
            ..Default::default()
        };
        Ok(())
    }

    pub fn sent(&mut self, calls_id: String) {
        self.is_pending = false;
        self.calls_id = Some(calls_id);
    }

    pub fn fail(&mut self, error: &DemoError) {
        self.is_pending = false;
        self.error = Some(error.to_string());
        self.hint = error.hint();
    }

    /// Record a status answer; answers for an older batch are ignored
    pub fn observe_status(&mut self, calls_id: &str, status: &CallsStatusResponse) {
        if self.calls_id.as_deref() != Some(calls_id) {
            return;
        }
        self.calls_status = Some(status.status);
        self.transaction_hash = status.first_transaction_hash();
    }

    pub fn view(&self, explorer: &demo_core::chain::Explorer) -> WalletPanelView {
        WalletPanelView {
            can_send: self.can_send(),
            send_label: self.send_label(),
            calls_id: self.calls_id.clone(),
            status: self.calls_status,
            transaction_hash: self.transaction_hash,
            transaction_url: self.transaction_hash.map(|hash| explorer.tx_url(hash)),
            error: self.error.clone(),
            hint: self.hint,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPanelView {
    pub can_send: bool,
    pub send_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CallsStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_core::error::RpcErrorKind;

    #[test]
    fn pending_send_disables_button() {
        let mut panel = WalletBatchPanel::default();
        assert!(panel.can_send());
        assert_eq!(panel.send_label(), "Send Batch Calls");

        panel.begin_send().unwrap();
        assert!(!panel.can_send());
        assert_eq!(panel.send_label(), "Waiting for wallet...");
        assert!(matches!(
            panel.begin_send(),
            Err(DemoError::PanelBusy { .. })
        ));

        panel.sent("0xabc".to_string());
        assert!(panel.can_send());
        assert_eq!(panel.calls_id.as_deref(), Some("0xabc"));
    }

    #[test]
    fn unsupported_contract_failure_carries_revoke_hint() {
        let mut panel = WalletBatchPanel::default();
        panel.begin_send().unwrap();
        panel.fail(&DemoError::WalletError {
            wallet_url: "http://wallet".to_string(),
            message: "unsupported contract".to_string(),
            kind: RpcErrorKind::InternalError {
                message: "unsupported contract".to_string(),
            },
        });

        assert!(panel.can_send());
        assert!(panel.hint.unwrap().contains("Revoke"));
        assert!(panel.error.unwrap().contains("unsupported contract"));
    }

    #[test]
    fn status_for_a_stale_batch_is_ignored() {
        let mut panel = WalletBatchPanel::default();
        panel.begin_send().unwrap();
        panel.sent("0x2".to_string());

        let status = CallsStatusResponse {
            id: None,
            chain_id: None,
            status: CallsStatus::Success,
            atomic: Some(true),
            receipts: vec![],
        };
        panel.observe_status("0x1", &status);
        assert_eq!(panel.calls_status, None);

        panel.observe_status("0x2", &status);
        assert_eq!(panel.calls_status, Some(CallsStatus::Success));
        assert_eq!(panel.transaction_hash, None);
    }

    #[test]
    fn new_send_clears_previous_batch() {
        let mut panel = WalletBatchPanel::default();
        panel.begin_send().unwrap();
        panel.sent("0x1".to_string());
        panel.begin_send().unwrap();
        assert!(panel.calls_id.is_none());
        assert!(panel.error.is_none());
    }
}
