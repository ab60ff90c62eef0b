use std::sync::Arc;

use crate::config::Config;
use crate::repository::{GameCatalog, LedgerRepository, SessionRepository};
use crate::services::{GamingService, WalletService};

/// Shared handler state. Repositories are trait objects so integration
/// tests can run the full router over the in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub wallet: Arc<WalletService>,
    pub gaming: Arc<GamingService>,
    pub ledger: Arc<dyn LedgerRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        ledger: Arc<dyn LedgerRepository>,
        sessions: Arc<dyn SessionRepository>,
        catalog: Arc<dyn GameCatalog>,
    ) -> Self {
        let wallet = Arc::new(WalletService::new(
            Arc::clone(&ledger),
            config.wallet.clone(),
        ));
        let gaming = Arc::new(GamingService::new(
            Arc::clone(&wallet),
            sessions,
            catalog,
        ));
        Self {
            config: Arc::new(config),
            wallet,
            gaming,
            ledger,
        }
    }
}
