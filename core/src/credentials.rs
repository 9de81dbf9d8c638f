use std::fmt;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};

use crate::error::DemoError;

#[derive(Clone)]
pub enum SigningCredential {
    /// Key material held in process memory; meant for testnet keys only
    PrivateKey(PrivateKeySigner),
}

impl SigningCredential {
    /// Parse a hex private key, with or without the `0x` prefix
    pub fn from_private_key(input: &str) -> Result<Self, DemoError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DemoError::ValidationError {
                message: "A private key is required".to_string(),
            });
        }

        let normalized = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            trimmed.to_string()
        } else {
            format!("0x{trimmed}")
        };

        // the parse error is dropped on purpose, it can echo the input
        let signer = normalized
            .parse::<PrivateKeySigner>()
            .map_err(|_| DemoError::ValidationError {
                message: "Private key must be 32 bytes of hex".to_string(),
            })?;

        Ok(SigningCredential::PrivateKey(signer))
    }

    pub fn random_local() -> Self {
        SigningCredential::PrivateKey(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        match self {
            SigningCredential::PrivateKey(signer) => signer.address(),
        }
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningCredential::PrivateKey(signer) => f
                .debug_struct("PrivateKey")
                .field("address", &signer.address())
                .finish_non_exhaustive(),
        }
    }
}
