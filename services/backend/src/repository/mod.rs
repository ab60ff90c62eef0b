//! Storage layer for wallets, transactions, sessions and the game catalog.
//!
//! Two implementations share the same traits: a Redis-backed one for
//! deployment and a DashMap-backed one for tests and single-node use.
//! Every balance mutation is a single atomic unit at this layer; the service
//! code above never does read-modify-write on a balance.

pub mod memory;
pub mod redis_ledger_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{Amount, Currency};
use uuid::Uuid;

use crate::domain::{
    BalanceChange, Game, GameResult, GameSession, Transaction, TransactionKind,
};
use crate::errors::Result;

pub use memory::{MemoryGameCatalog, MemoryLedgerRepository, MemorySessionRepository};
pub use redis_ledger_repository::{
    RedisGameCatalog, RedisLedgerRepository, RedisSessionRepository,
};

/// Wallet and transaction storage.
///
/// Contract: `settle_transaction` applies the balance delta AND flips the
/// pending row to `Completed` in one atomic unit. A transaction that stays
/// `Pending` therefore means its mutation never applied, which is what lets
/// the reconciliation sweep mark it `Failed` without inspecting balances.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Storage liveness probe for health reporting.
    async fn ping(&self) -> Result<()>;

    async fn get_wallet(&self, user_id: &str) -> Result<Option<crate::domain::Wallet>>;

    /// Idempotent: concurrent calls for the same user converge on one wallet.
    async fn get_or_create_wallet(&self, user_id: &str) -> Result<crate::domain::Wallet>;

    /// Atomic conditional balance mutation. Debits fail with
    /// `InsufficientFunds` when the result would go negative; the matching
    /// lifetime counter is bumped in the same unit.
    async fn apply_balance(
        &self,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange>;

    async fn insert_transaction(&self, tx: &Transaction) -> Result<()>;

    async fn find_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>>;

    async fn find_by_external_id(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<Transaction>>;

    /// Atomically claim `external_id` for `transaction_id` (first writer
    /// wins). Returns the id that owns the key afterwards: the given id when
    /// the claim won, the earlier transaction's id on a replay.
    async fn claim_external_id(
        &self,
        user_id: &str,
        external_id: &str,
        transaction_id: Uuid,
    ) -> Result<Uuid>;

    /// Newest first.
    async fn list_transactions(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>>;

    /// Apply the delta and complete the pending row atomically.
    async fn settle_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange>;

    /// Apply both conversion legs (debit source, credit destination) and
    /// complete the row atomically. Returns the source-side balance change.
    async fn settle_conversion(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        debit: Amount,
        from: Currency,
        credit: Amount,
        to: Currency,
    ) -> Result<BalanceChange>;

    async fn mark_transaction_failed(&self, transaction_id: Uuid, reason: &str) -> Result<()>;

    /// Flip the wallet's one-time bonus flag. Returns true exactly once per
    /// wallet, no matter how many concurrent deposits race on it.
    async fn claim_welcome_bonus(&self, user_id: &str) -> Result<bool>;

    /// Pending transactions older than `cutoff`, oldest first.
    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>>;
}

/// Session and round-result storage. The gaming service is the only writer.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: &GameSession) -> Result<()>;

    async fn find_session(&self, session_id: Uuid) -> Result<Option<GameSession>>;

    /// Accumulate one round into the session stats and return the updated
    /// session.
    async fn record_round(
        &self,
        session_id: Uuid,
        bet: Amount,
        win: Amount,
    ) -> Result<GameSession>;

    /// Active -> Completed with `ended_at` set.
    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<GameSession>;

    async fn insert_result(&self, result: &GameResult) -> Result<()>;

    /// A session's round results in play order.
    async fn list_results(&self, session_id: Uuid) -> Result<Vec<GameResult>>;
}

#[async_trait]
pub trait GameCatalog: Send + Sync {
    async fn get(&self, game_id: &str) -> Result<Option<Game>>;

    async fn list(&self) -> Result<Vec<Game>>;

    async fn upsert(&self, game: &Game) -> Result<()>;
}

/// Install the default games when the catalog is empty.
pub async fn seed_default_games(catalog: &dyn GameCatalog) -> Result<()> {
    use crate::domain::{GameStatus, GameType};

    if !catalog.list().await?.is_empty() {
        return Ok(());
    }

    let defaults = [
        Game {
            game_id: "cricket-slots".to_string(),
            name: "Cricket Slots".to_string(),
            game_type: GameType::SlotMachine,
            min_bet: Amount::from_minor(10),
            max_bet: Amount::from_minor(10_000),
            rtp_percentage: 95.0,
            status: GameStatus::Active,
        },
        Game {
            game_id: "crash".to_string(),
            name: "Crash".to_string(),
            game_type: GameType::CrashGame,
            min_bet: Amount::from_minor(10),
            max_bet: Amount::from_minor(50_000),
            rtp_percentage: 97.0,
            status: GameStatus::Active,
        },
        Game {
            game_id: "dice".to_string(),
            name: "Dice".to_string(),
            game_type: GameType::Dice,
            min_bet: Amount::from_minor(10),
            max_bet: Amount::from_minor(25_000),
            rtp_percentage: 95.0,
            status: GameStatus::Active,
        },
    ];

    for game in &defaults {
        catalog.upsert(game).await?;
    }

    tracing::info!(game_count = defaults.len(), "Seeded default game catalog");
    Ok(())
}
