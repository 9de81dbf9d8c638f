use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{DEMO_RECIPIENT_ONE, DEMO_RECIPIENT_TWO, DEMO_TRANSFER_VALUE};

/// ### InnerCall
/// One call of a batch: executed by the delegated account, or handed to a wallet.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InnerCall {
    pub to: Address,

    #[serde(default)]
    pub data: Bytes,

    #[serde(default)]
    pub value: U256,
}

impl InnerCall {
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to,
            data: Bytes::new(),
            value,
        }
    }
}

/// The batch used by both demo flows: 0.0001 ETH to each of two burn addresses
pub fn demo_calls() -> Vec<InnerCall> {
    vec![
        InnerCall::transfer(DEMO_RECIPIENT_ONE, DEMO_TRANSFER_VALUE),
        InnerCall::transfer(DEMO_RECIPIENT_TWO, DEMO_TRANSFER_VALUE),
    ]
}

/// Sum of the values carried by `calls`; `None` on overflow
pub fn total_value(calls: &[InnerCall]) -> Option<U256> {
    calls
        .iter()
        .try_fold(U256::ZERO, |acc, call| acc.checked_add(call.value))
}
