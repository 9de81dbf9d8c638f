use alloy::{eips::eip7702::SignedAuthorization, primitives::Address, providers::Provider};
use demo_core::{
    chain::Chain,
    credentials::SigningCredential,
    error::{AlloyRpcErrorToDemoError, DemoError},
    signer::{AccountSigner, EoaSigningOptions},
};
use serde::Serialize;

use crate::constants::{EIP_7702_DELEGATION_CODE_LENGTH, EIP_7702_DELEGATION_PREFIX};

/// What `eth_getCode` says about an EOA's delegation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationStatus {
    /// Code is a well-formed delegation indicator
    pub delegated: bool,
    /// Contract the indicator points at
    pub target: Option<Address>,
    pub code_length: usize,
}

impl DelegationStatus {
    /// Parse account code; only `0xef0100 ‖ address` counts as a delegation
    pub fn from_code(code: &[u8]) -> Self {
        let target = (code.len() == EIP_7702_DELEGATION_CODE_LENGTH
            && code.starts_with(&EIP_7702_DELEGATION_PREFIX))
        .then(|| Address::from_slice(&code[EIP_7702_DELEGATION_PREFIX.len()..]));

        Self {
            delegated: target.is_some(),
            target,
            code_length: code.len(),
        }
    }

    /// Delegated to `contract`, or to anything when `contract` is `None`
    pub fn is_delegated_to(&self, contract: Option<Address>) -> bool {
        match (self.target, contract) {
            (Some(target), Some(contract)) => target == contract,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Nonce a self-sent authorization must carry. The transaction bumps the
/// sender's nonce before the authorization list is processed.
pub fn self_executed_authorization_nonce(account_nonce: u64) -> u64 {
    account_nonce + 1
}

/// Represents an EOA address that can have EIP-7702 delegation, associated with a specific chain
#[derive(Clone, Debug)]
pub struct DelegatedAccount<C: Chain> {
    /// The EOA address that may have delegation
    pub eoa_address: Address,
    /// The chain this account operates on
    pub chain: C,
}

impl<C: Chain> DelegatedAccount<C> {
    pub fn new(eoa_address: Address, chain: C) -> Self {
        Self { eoa_address, chain }
    }

    pub fn address(&self) -> Address {
        self.eoa_address
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Read the account code and interpret its delegation indicator
    pub async fn delegation_status(&self) -> Result<DelegationStatus, DemoError> {
        let code = self
            .chain
            .provider()
            .get_code_at(self.eoa_address)
            .await
            .map_err(|e| e.to_demo_error(self.chain()))?;

        let status = DelegationStatus::from_code(&code);

        tracing::debug!(
            eoa_address = ?self.eoa_address,
            code_length = status.code_length,
            target = ?status.target,
            has_delegation = status.delegated,
            "EIP-7702 delegation check result"
        );

        Ok(status)
    }

    pub async fn is_delegated_to(&self, contract: Option<Address>) -> Result<bool, DemoError> {
        Ok(self.delegation_status().await?.is_delegated_to(contract))
    }

    pub async fn get_nonce(&self) -> Result<u64, DemoError> {
        self.chain
            .provider()
            .get_transaction_count(self.eoa_address)
            .await
            .map_err(|e| e.to_demo_error(self.chain()))
    }

    /// Sign an authorization for a transaction this EOA sends itself (automatically fetches nonce)
    pub async fn sign_authorization<S: AccountSigner>(
        &self,
        eoa_signer: &S,
        credentials: &SigningCredential,
        delegation_contract: Address,
    ) -> Result<SignedAuthorization, DemoError> {
        let nonce = self_executed_authorization_nonce(self.get_nonce().await?);

        let signing_options = EoaSigningOptions {
            from: self.eoa_address,
            chain_id: Some(self.chain.chain_id()),
        };

        eoa_signer
            .sign_authorization(
                signing_options,
                self.chain.chain_id(),
                delegation_contract,
                nonce,
                credentials,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BATCH_CALL_DELEGATION_ADDRESS;

    fn indicator(target: Address) -> Vec<u8> {
        let mut code = EIP_7702_DELEGATION_PREFIX.to_vec();
        code.extend_from_slice(target.as_slice());
        code
    }

    #[test]
    fn empty_code_is_not_delegated() {
        let status = DelegationStatus::from_code(&[]);
        assert!(!status.delegated);
        assert_eq!(status.target, None);
        assert!(!status.is_delegated_to(None));
    }

    #[test]
    fn indicator_yields_target() {
        let status = DelegationStatus::from_code(&indicator(BATCH_CALL_DELEGATION_ADDRESS));
        assert!(status.delegated);
        assert_eq!(status.target, Some(BATCH_CALL_DELEGATION_ADDRESS));
        assert!(status.is_delegated_to(None));
        assert!(status.is_delegated_to(Some(BATCH_CALL_DELEGATION_ADDRESS)));
        assert!(!status.is_delegated_to(Some(Address::repeat_byte(1))));
    }

    #[test]
    fn contract_code_is_not_an_indicator() {
        // PUSH1 0x80 PUSH1 0x40 MSTORE, then padding to indicator length
        let mut code = vec![0x60, 0x80, 0x60, 0x40, 0x52];
        code.resize(EIP_7702_DELEGATION_CODE_LENGTH, 0);
        let status = DelegationStatus::from_code(&code);
        assert!(!status.delegated);
        assert_eq!(status.code_length, EIP_7702_DELEGATION_CODE_LENGTH);
    }

    #[test]
    fn truncated_or_oversized_indicator_is_rejected() {
        let code = indicator(BATCH_CALL_DELEGATION_ADDRESS);
        assert!(!DelegationStatus::from_code(&code[..22]).delegated);

        let mut longer = code.clone();
        longer.push(0);
        assert!(!DelegationStatus::from_code(&longer).delegated);
    }

    #[test]
    fn self_executed_authorization_uses_next_nonce() {
        assert_eq!(self_executed_authorization_nonce(0), 1);
        assert_eq!(self_executed_authorization_nonce(4), 5);
    }
}
