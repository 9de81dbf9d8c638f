use alloy::{
    consensus::TypedTransaction,
    eips::eip7702::{Authorization, SignedAuthorization},
    network::TxSigner,
    primitives::{Address, ChainId, U256},
    signers::{Signature, Signer},
};
use serde::{Deserialize, Serialize};

use crate::{credentials::SigningCredential, error::DemoError};

/// EOA signing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EoaSigningOptions {
    /// The EOA address to sign with
    pub from: Address,
    /// Optional chain ID for the signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
}

/// Account signer trait using impl Future pattern
pub trait AccountSigner {
    /// Sign an EIP-191 personal message
    fn sign_message(
        &self,
        options: EoaSigningOptions,
        message: &[u8],
        credentials: &SigningCredential,
    ) -> impl std::future::Future<Output = Result<Signature, DemoError>> + Send;

    /// Sign a typed transaction (the caller attaches the signature)
    fn sign_transaction(
        &self,
        options: EoaSigningOptions,
        transaction: &TypedTransaction,
        credentials: &SigningCredential,
    ) -> impl std::future::Future<Output = Result<Signature, DemoError>> + Send;

    /// Sign an EIP-7702 authorization designating `address` as the account's code
    fn sign_authorization(
        &self,
        options: EoaSigningOptions,
        chain_id: u64,
        address: Address,
        nonce: u64,
        credentials: &SigningCredential,
    ) -> impl std::future::Future<Output = Result<SignedAuthorization, DemoError>> + Send;
}

/// Signs with key material supplied alongside each request
#[derive(Clone, Debug, Default)]
pub struct EoaSigner;

impl EoaSigner {
    pub fn new() -> Self {
        Self
    }

    fn check_sender(
        options: &EoaSigningOptions,
        credentials: &SigningCredential,
    ) -> Result<(), DemoError> {
        let address = credentials.address();
        if options.from != address {
            return Err(DemoError::SigningError {
                message: format!(
                    "Credential controls {address}, but signing was requested for {}",
                    options.from
                ),
            });
        }
        Ok(())
    }
}

impl AccountSigner for EoaSigner {
    async fn sign_message(
        &self,
        options: EoaSigningOptions,
        message: &[u8],
        credentials: &SigningCredential,
    ) -> Result<Signature, DemoError> {
        Self::check_sender(&options, credentials)?;

        match credentials {
            SigningCredential::PrivateKey(signer) => {
                signer
                    .sign_message(message)
                    .await
                    .map_err(|e| DemoError::SigningError {
                        message: format!("Failed to sign message: {e}"),
                    })
            }
        }
    }

    async fn sign_transaction(
        &self,
        options: EoaSigningOptions,
        transaction: &TypedTransaction,
        credentials: &SigningCredential,
    ) -> Result<Signature, DemoError> {
        Self::check_sender(&options, credentials)?;

        match credentials {
            SigningCredential::PrivateKey(signer) => {
                let mut tx = transaction.clone();
                signer
                    .sign_transaction(&mut tx)
                    .await
                    .map_err(|e| DemoError::SigningError {
                        message: format!("Failed to sign transaction: {e}"),
                    })
            }
        }
    }

    async fn sign_authorization(
        &self,
        options: EoaSigningOptions,
        chain_id: u64,
        address: Address,
        nonce: u64,
        credentials: &SigningCredential,
    ) -> Result<SignedAuthorization, DemoError> {
        Self::check_sender(&options, credentials)?;

        match credentials {
            SigningCredential::PrivateKey(signer) => {
                let authorization = Authorization {
                    chain_id: U256::from(chain_id),
                    address,
                    nonce,
                };
                let authorization_hash = authorization.signature_hash();
                let signature = signer.sign_hash(&authorization_hash).await.map_err(|e| {
                    DemoError::SigningError {
                        message: format!("Failed to sign authorization: {e}"),
                    }
                })?;

                tracing::debug!(
                    authority = ?options.from,
                    delegate = ?address,
                    chain_id,
                    nonce,
                    "Signed EIP-7702 authorization"
                );

                Ok(authorization.into_signed(signature))
            }
        }
    }
}
