//! DashMap-backed repositories.
//!
//! Per-user serialization comes from holding the wallet's entry lock across
//! the check-then-write, which gives the same guarantee the Redis Lua
//! scripts give: no interleaved balance mutation can observe a stale read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared::{Amount, Currency};
use uuid::Uuid;

use crate::domain::{
    BalanceChange, Game, GameResult, GameSession, SessionStatus, Transaction, TransactionKind,
    TransactionStatus, Wallet,
};
use crate::errors::{AppError, Result};

use super::{GameCatalog, LedgerRepository, SessionRepository};

#[derive(Default)]
pub struct MemoryLedgerRepository {
    wallets: DashMap<String, Wallet>,
    transactions: DashMap<Uuid, Transaction>,
    /// Per-user transaction ids in insertion order.
    user_index: DashMap<String, Vec<Uuid>>,
    /// "{user_id}:{external_id}" -> transaction id.
    external_index: DashMap<String, Uuid>,
}

impl MemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn external_key(user_id: &str, external_id: &str) -> String {
        format!("{}:{}", user_id, external_id)
    }

    /// Mutate the wallet under its entry lock. Errors leave it untouched.
    fn apply_to_wallet(
        wallet: &mut Wallet,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange> {
        let before = wallet.balance(currency);
        let after = before.checked_add(delta)?;
        if after.is_negative() {
            return Err(AppError::InsufficientFunds {
                required: delta.abs(),
                available: before,
            });
        }

        match currency {
            Currency::Inr => wallet.inr_balance = after,
            Currency::Hc => wallet.hc_balance = after,
        }

        let magnitude = delta.abs();
        match kind {
            TransactionKind::Deposit => {
                wallet.total_deposited = wallet.total_deposited.checked_add(magnitude)?
            }
            TransactionKind::Withdrawal => {
                wallet.total_withdrawn = wallet.total_withdrawn.checked_add(magnitude)?
            }
            TransactionKind::BetPlaced => {
                wallet.total_bet_amount = wallet.total_bet_amount.checked_add(magnitude)?
            }
            TransactionKind::BetWon => {
                wallet.total_winnings = wallet.total_winnings.checked_add(magnitude)?
            }
            TransactionKind::WelcomeBonus
            | TransactionKind::ConversionInrToHc
            | TransactionKind::ConversionHcToInr => {}
        }

        wallet.updated_at = Utc::now();
        Ok(BalanceChange { before, after })
    }

    fn complete_transaction(&self, transaction_id: Uuid, change: BalanceChange) {
        if let Some(mut tx) = self.transactions.get_mut(&transaction_id) {
            tx.status = TransactionStatus::Completed;
            tx.balance_before = change.before;
            tx.balance_after = Some(change.after);
            tx.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>> {
        Ok(self.wallets.get(user_id).map(|w| w.clone()))
    }

    async fn get_or_create_wallet(&self, user_id: &str) -> Result<Wallet> {
        Ok(self
            .wallets
            .entry(user_id.to_string())
            .or_insert_with(|| Wallet::new(user_id))
            .clone())
    }

    async fn apply_balance(
        &self,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange> {
        let mut wallet = self
            .wallets
            .get_mut(user_id)
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;
        Self::apply_to_wallet(&mut wallet, delta, currency, kind)
    }

    async fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        self.transactions.insert(tx.transaction_id, tx.clone());
        self.user_index
            .entry(tx.user_id.clone())
            .or_default()
            .push(tx.transaction_id);
        Ok(())
    }

    async fn find_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.transactions.get(&transaction_id).map(|t| t.clone()))
    }

    async fn find_by_external_id(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<Transaction>> {
        let id = self
            .external_index
            .get(&Self::external_key(user_id, external_id))
            .map(|r| *r);
        match id {
            Some(id) => self.find_transaction(id).await,
            None => Ok(None),
        }
    }

    async fn claim_external_id(
        &self,
        user_id: &str,
        external_id: &str,
        transaction_id: Uuid,
    ) -> Result<Uuid> {
        // The entry lock makes the claim first-writer-wins.
        match self
            .external_index
            .entry(Self::external_key(user_id, external_id))
        {
            Entry::Occupied(existing) => Ok(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(transaction_id);
                Ok(transaction_id)
            }
        }
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let ids: Vec<Uuid> = self
            .user_index
            .get(user_id)
            .map(|v| v.iter().rev().skip(offset).take(limit).copied().collect())
            .unwrap_or_default();

        let mut transactions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tx) = self.transactions.get(&id) {
                transactions.push(tx.clone());
            }
        }
        Ok(transactions)
    }

    async fn settle_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange> {
        let change = {
            let mut wallet = self
                .wallets
                .get_mut(user_id)
                .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;
            let change = Self::apply_to_wallet(&mut wallet, delta, currency, kind)?;
            // Complete the row while the wallet lock is still held so no
            // other settle can interleave between mutation and completion.
            self.complete_transaction(transaction_id, change);
            change
        };
        Ok(change)
    }

    async fn settle_conversion(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        debit: Amount,
        from: Currency,
        credit: Amount,
        to: Currency,
    ) -> Result<BalanceChange> {
        let kind = match from {
            Currency::Inr => TransactionKind::ConversionInrToHc,
            Currency::Hc => TransactionKind::ConversionHcToInr,
        };
        let change = {
            let mut wallet = self
                .wallets
                .get_mut(user_id)
                .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;
            let change =
                Self::apply_to_wallet(&mut wallet, debit.abs().checked_neg()?, from, kind)?;
            // The debit succeeded; the credit cannot fail the balance check.
            Self::apply_to_wallet(&mut wallet, credit, to, kind)?;
            self.complete_transaction(transaction_id, change);
            change
        };
        Ok(change)
    }

    async fn mark_transaction_failed(&self, transaction_id: Uuid, reason: &str) -> Result<()> {
        let mut tx = self
            .transactions
            .get_mut(&transaction_id)
            .ok_or_else(|| AppError::Storage(format!("Unknown transaction {}", transaction_id)))?;
        tx.status = TransactionStatus::Failed;
        tx.description = format!("{} (failed: {})", tx.description, reason);
        tx.updated_at = Utc::now();
        Ok(())
    }

    async fn claim_welcome_bonus(&self, user_id: &str) -> Result<bool> {
        let mut wallet = self
            .wallets
            .get_mut(user_id)
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;
        if wallet.welcome_bonus_claimed {
            Ok(false)
        } else {
            wallet.welcome_bonus_claimed = true;
            wallet.updated_at = Utc::now();
            Ok(true)
        }
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut stale: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Pending && t.created_at < cutoff)
            .map(|t| t.clone())
            .collect();
        stale.sort_by_key(|t| t.created_at);
        stale.truncate(limit);
        Ok(stale)
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<Uuid, GameSession>,
    results: DashMap<Uuid, GameResult>,
    /// Per-session result ids in play order.
    session_results: DashMap<Uuid, Vec<Uuid>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn insert_session(&self, session: &GameSession) -> Result<()> {
        self.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<GameSession>> {
        Ok(self.sessions.get(&session_id).map(|s| s.clone()))
    }

    async fn record_round(
        &self,
        session_id: Uuid,
        bet: Amount,
        win: Amount,
    ) -> Result<GameSession> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        session.total_spins += 1;
        session.total_bet = session.total_bet.checked_add(bet)?;
        session.total_winnings = session.total_winnings.checked_add(win)?;
        Ok(session.clone())
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<GameSession> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(AppError::SessionNotFound(session_id))?;
        if session.status == SessionStatus::Active {
            session.status = SessionStatus::Completed;
            session.ended_at = Some(ended_at);
        }
        Ok(session.clone())
    }

    async fn insert_result(&self, result: &GameResult) -> Result<()> {
        self.results.insert(result.result_id, result.clone());
        self.session_results
            .entry(result.session_id)
            .or_default()
            .push(result.result_id);
        Ok(())
    }

    async fn list_results(&self, session_id: Uuid) -> Result<Vec<GameResult>> {
        let ids: Vec<Uuid> = self
            .session_results
            .get(&session_id)
            .map(|v| v.clone())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(result) = self.results.get(&id) {
                results.push(result.clone());
            }
        }
        Ok(results)
    }
}

#[derive(Default)]
pub struct MemoryGameCatalog {
    games: DashMap<String, Game>,
}

impl MemoryGameCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameCatalog for MemoryGameCatalog {
    async fn get(&self, game_id: &str) -> Result<Option<Game>> {
        Ok(self.games.get(game_id).map(|g| g.clone()))
    }

    async fn list(&self) -> Result<Vec<Game>> {
        let mut games: Vec<Game> = self.games.iter().map(|g| g.clone()).collect();
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        Ok(games)
    }

    async fn upsert(&self, game: &Game) -> Result<()> {
        self.games.insert(game.game_id.clone(), game.clone());
        Ok(())
    }
}
