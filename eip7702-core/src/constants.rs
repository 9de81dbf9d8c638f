use alloy::primitives::{Address, address};

/// EIP-7702 delegation prefix bytes
pub const EIP_7702_DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// EIP-7702 delegation code length (prefix + address)
pub const EIP_7702_DELEGATION_CODE_LENGTH: usize = 23;

/// Minimal `execute(Call[])` delegate deployed on Sepolia
pub const BATCH_CALL_DELEGATION_ADDRESS: Address =
    address!("0x4Cd241E8d1510e30b2076397afc7508Ae59C66c9");

/// Delegating to the zero address clears the delegation indicator
pub const REVOKE_DELEGATION_ADDRESS: Address = Address::ZERO;

/// Percentage added on top of `eth_estimateGas`
pub const GAS_LIMIT_BUFFER_PERCENT: u64 = 10;
