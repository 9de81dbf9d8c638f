use alloy::primitives::{Address, U256, address};

/// Sepolia testnet chain id
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

pub const SEPOLIA_DEFAULT_RPC_URL: &str = "https://1rpc.io/sepolia";

pub const SEPOLIA_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

/// 0.0001 ether, the amount moved by each call of the demo batch
pub const DEMO_TRANSFER_VALUE: U256 = U256::from_limbs([100_000_000_000_000, 0, 0, 0]);

pub const DEMO_RECIPIENT_ONE: Address = address!("0x0000000000000000000000000000000000000001");

pub const DEMO_RECIPIENT_TWO: Address = address!("0x0000000000000000000000000000000000000002");
