pub mod constants;
pub mod delegated_account;
pub mod transaction;
pub mod wallet_calls;
