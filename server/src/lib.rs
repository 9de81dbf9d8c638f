pub mod chains;
pub mod config;
pub mod http;
pub mod panels;

// Re-export commonly used types for integration tests and external usage
pub use chains::DemoChainService;
pub use config::{DelegationConfig, DemoConfig, NetworkConfig, ServerConfig, WalletConfig};
pub use http::server::{DemoServer, DemoServerState, DemoSettings};
