pub mod transport;
pub mod wallet;

pub use wallet::WalletClient;
