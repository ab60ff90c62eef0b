pub mod gaming_service;
pub mod wallet_service;

pub use gaming_service::GamingService;
pub use wallet_service::WalletService;
