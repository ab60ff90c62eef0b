//! Redis-backed repositories.
//!
//! Wallets, transactions, sessions and results are stored as hashes; sorted
//! sets index per-user transaction history, pending transactions and
//! per-session results. Balance mutations go through Lua scripts so the
//! check-then-write and the transaction completion are one atomic unit.

mod codec;
mod keys;
mod lua_scripts;
mod status;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use shared::{Amount, Currency};
use uuid::Uuid;

use crate::domain::{
    BalanceChange, Game, GameResult, GameSession, SessionStatus, Transaction, TransactionKind,
    TransactionStatus, Wallet,
};
use crate::errors::{AppError, Result};

use codec::*;
use keys::*;
use lua_scripts::*;
use status::{balance_field, lifetime_counter_field};

use super::{GameCatalog, LedgerRepository, SessionRepository};

pub struct RedisLedgerRepository {
    redis: ConnectionManager,
}

impl RedisLedgerRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn decode_balance_reply(
        reply: Vec<i64>,
        user_id: &str,
        delta: Amount,
    ) -> Result<BalanceChange> {
        match reply.as_slice() {
            [0, before, after] => Ok(BalanceChange {
                before: Amount::from_minor(*before),
                after: Amount::from_minor(*after),
            }),
            [-1, before] => Err(AppError::InsufficientFunds {
                required: delta.abs(),
                available: Amount::from_minor(*before),
            }),
            [-2] => Err(AppError::WalletNotFound(user_id.to_string())),
            other => Err(AppError::Storage(format!(
                "Unexpected balance script reply: {:?}",
                other
            ))),
        }
    }

    async fn load_transaction(
        redis: &mut ConnectionManager,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>> {
        let map: std::collections::HashMap<String, String> =
            redis.hgetall(tx_key(transaction_id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        transaction_from_hash(&map, transaction_id).map(Some)
    }
}

#[async_trait]
impl LedgerRepository for RedisLedgerRepository {
    async fn ping(&self) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut redis_conn).await?;
        Ok(())
    }

    async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>> {
        let mut redis_conn = self.redis.clone();
        let map: std::collections::HashMap<String, String> =
            redis_conn.hgetall(wallet_key(user_id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        wallet_from_hash(&map, user_id).map(Some)
    }

    async fn get_or_create_wallet(&self, user_id: &str) -> Result<Wallet> {
        let candidate = Wallet::new(user_id);

        let mut redis_conn = self.redis.clone();
        let script = Script::new(CREATE_WALLET_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation.key(wallet_key(user_id));
        for (field, value) in wallet_to_fields(&candidate) {
            invocation.arg(field).arg(value);
        }
        let created: i32 = invocation.invoke_async(&mut redis_conn).await?;

        if created == 1 {
            tracing::debug!(user_id = %user_id, wallet_id = %candidate.wallet_id, "Created wallet");
            return Ok(candidate);
        }

        self.get_wallet(user_id)
            .await?
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))
    }

    async fn apply_balance(
        &self,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(APPLY_BALANCE_SCRIPT);
        let reply: Vec<i64> = script
            .key(wallet_key(user_id))
            .arg(balance_field(&currency))
            .arg(delta.minor())
            .arg(lifetime_counter_field(&kind).unwrap_or(""))
            .arg(Utc::now().timestamp_millis())
            .invoke_async(&mut redis_conn)
            .await?;
        Self::decode_balance_reply(reply, user_id, delta)
    }

    async fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let created_ms = tx.created_at.timestamp_millis();
        let fields = transaction_to_fields(tx);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset_multiple(tx_key(tx.transaction_id), &fields).ignore();
        pipe.zadd(
            tx_user_index_key(&tx.user_id),
            tx.transaction_id.to_string(),
            created_ms,
        )
        .ignore();
        if tx.status == TransactionStatus::Pending {
            pipe.zadd(
                tx_pending_index_key(),
                tx.transaction_id.to_string(),
                created_ms,
            )
            .ignore();
        }
        let _: () = pipe.query_async(&mut redis_conn).await?;
        Ok(())
    }

    async fn find_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>> {
        let mut redis_conn = self.redis.clone();
        Self::load_transaction(&mut redis_conn, transaction_id).await
    }

    async fn find_by_external_id(
        &self,
        user_id: &str,
        external_id: &str,
    ) -> Result<Option<Transaction>> {
        let mut redis_conn = self.redis.clone();
        let id: Option<String> = redis_conn
            .get(tx_external_index_key(user_id, external_id))
            .await?;
        match id.and_then(|s| Uuid::parse_str(&s).ok()) {
            Some(id) => Self::load_transaction(&mut redis_conn, id).await,
            None => Ok(None),
        }
    }

    async fn claim_external_id(
        &self,
        user_id: &str,
        external_id: &str,
        transaction_id: Uuid,
    ) -> Result<Uuid> {
        let mut redis_conn = self.redis.clone();
        let key = tx_external_index_key(user_id, external_id);

        // SET NX serializes racing claims; the key is never deleted, so a
        // failed claim always finds the winner with a plain GET.
        let claimed: bool = redis_conn
            .set_nx(&key, transaction_id.to_string())
            .await?;
        if claimed {
            return Ok(transaction_id);
        }

        let owner: Option<String> = redis_conn.get(&key).await?;
        owner
            .and_then(|s| Uuid::parse_str(&s).ok())
            .ok_or_else(|| {
                AppError::Storage(format!("Corrupt external id index entry {}", key))
            })
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut redis_conn = self.redis.clone();
        let key = tx_user_index_key(user_id);

        let start = offset as isize;
        let end = (offset + limit) as isize - 1;
        let ids: Vec<String> = redis_conn.zrevrange(&key, start, end).await?;

        let mut transactions = Vec::with_capacity(ids.len());
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(tx) = Self::load_transaction(&mut redis_conn, id).await? {
                    transactions.push(tx);
                }
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
        let mut redis_conn = self.redis.clone();
        let script = Script::new(SETTLE_TRANSACTION_SCRIPT);
        let reply: Vec<i64> = script
            .key(wallet_key(user_id))
            .key(tx_key(transaction_id))
            .key(tx_pending_index_key())
            .arg(balance_field(&currency))
            .arg(delta.minor())
            .arg(lifetime_counter_field(&kind).unwrap_or(""))
            .arg(Utc::now().timestamp_millis())
            .arg(transaction_id.to_string())
            .invoke_async(&mut redis_conn)
            .await?;
        Self::decode_balance_reply(reply, user_id, delta)
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
        let mut redis_conn = self.redis.clone();
        let script = Script::new(SETTLE_CONVERSION_SCRIPT);
        let reply: Vec<i64> = script
            .key(wallet_key(user_id))
            .key(tx_key(transaction_id))
            .key(tx_pending_index_key())
            .arg(balance_field(&from))
            .arg(debit.abs().minor())
            .arg(balance_field(&to))
            .arg(credit.minor())
            .arg(Utc::now().timestamp_millis())
            .arg(transaction_id.to_string())
            .invoke_async(&mut redis_conn)
            .await?;
        Self::decode_balance_reply(reply, user_id, debit.abs().checked_neg()?)
    }

    async fn mark_transaction_failed(&self, transaction_id: Uuid, reason: &str) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let key = tx_key(transaction_id);

        let description: Option<String> = redis_conn.hget(&key, "description").await?;
        let description = format!(
            "{} (failed: {})",
            description.unwrap_or_default(),
            reason
        );

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset(&key, "status", "failed").ignore();
        pipe.hset(&key, "description", description).ignore();
        pipe.hset(&key, "updated_at_ms", Utc::now().timestamp_millis())
            .ignore();
        pipe.zrem(tx_pending_index_key(), transaction_id.to_string())
            .ignore();

        let _: () = pipe.query_async(&mut redis_conn).await?;
        Ok(())
    }

    async fn claim_welcome_bonus(&self, user_id: &str) -> Result<bool> {
        let mut redis_conn = self.redis.clone();
        let script = Script::new(CLAIM_WELCOME_BONUS_SCRIPT);
        let claimed: i32 = script
            .key(wallet_key(user_id))
            .arg(Utc::now().timestamp_millis())
            .invoke_async(&mut redis_conn)
            .await?;

        match claimed {
            1 => Ok(true),
            0 => Ok(false),
            _ => Err(AppError::WalletNotFound(user_id.to_string())),
        }
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn
            .zrangebyscore_limit(
                tx_pending_index_key(),
                "-inf",
                cutoff.timestamp_millis(),
                0,
                limit as isize,
            )
            .await?;

        let mut stale = Vec::with_capacity(ids.len());
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(tx) = Self::load_transaction(&mut redis_conn, id).await? {
                    stale.push(tx);
                }
            }
        }
        Ok(stale)
    }
}

pub struct RedisSessionRepository {
    redis: ConnectionManager,
}

impl RedisSessionRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    async fn load_session(
        redis: &mut ConnectionManager,
        session_id: Uuid,
    ) -> Result<Option<GameSession>> {
        let map: std::collections::HashMap<String, String> =
            redis.hgetall(session_key(session_id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        session_from_hash(&map, session_id).map(Some)
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn insert_session(&self, session: &GameSession) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let fields = session_to_fields(session);
        let _: () = redis_conn
            .hset_multiple(session_key(session.session_id), &fields)
            .await?;
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<GameSession>> {
        let mut redis_conn = self.redis.clone();
        Self::load_session(&mut redis_conn, session_id).await
    }

    async fn record_round(
        &self,
        session_id: Uuid,
        bet: Amount,
        win: Amount,
    ) -> Result<GameSession> {
        let mut redis_conn = self.redis.clone();
        let key = session_key(session_id);

        // HINCRBY on a missing session would create a partial hash.
        let exists: bool = redis_conn.exists(&key).await?;
        if !exists {
            return Err(AppError::SessionNotFound(session_id));
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hincr(&key, "total_spins", 1).ignore();
        pipe.hincr(&key, "total_bet", bet.minor()).ignore();
        pipe.hincr(&key, "total_winnings", win.minor()).ignore();
        let _: () = pipe.query_async(&mut redis_conn).await?;

        Self::load_session(&mut redis_conn, session_id)
            .await?
            .ok_or(AppError::SessionNotFound(session_id))
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<GameSession> {
        let mut redis_conn = self.redis.clone();
        let mut session = Self::load_session(&mut redis_conn, session_id)
            .await?
            .ok_or(AppError::SessionNotFound(session_id))?;

        if session.status == SessionStatus::Active {
            let key = session_key(session_id);
            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.hset(&key, "status", "completed").ignore();
            pipe.hset(&key, "ended_at_ms", ended_at.timestamp_millis())
                .ignore();
            let _: () = pipe.query_async(&mut redis_conn).await?;

            session.status = SessionStatus::Completed;
            session.ended_at = Some(ended_at);
        }
        Ok(session)
    }

    async fn insert_result(&self, result: &GameResult) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let fields = result_to_fields(result)?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset_multiple(result_key(result.result_id), &fields)
            .ignore();
        pipe.zadd(
            session_results_index_key(result.session_id),
            result.result_id.to_string(),
            result.created_at.timestamp_millis(),
        )
        .ignore();

        let _: () = pipe.query_async(&mut redis_conn).await?;
        Ok(())
    }

    async fn list_results(&self, session_id: Uuid) -> Result<Vec<GameResult>> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn
            .zrange(session_results_index_key(session_id), 0, -1)
            .await?;

        let mut results = Vec::with_capacity(ids.len());
        for id_str in ids {
            let Ok(id) = Uuid::parse_str(&id_str) else {
                continue;
            };
            let map: std::collections::HashMap<String, String> =
                redis_conn.hgetall(result_key(id)).await?;
            if !map.is_empty() {
                results.push(result_from_hash(&map, id)?);
            }
        }
        Ok(results)
    }
}

pub struct RedisGameCatalog {
    redis: ConnectionManager,
}

impl RedisGameCatalog {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl GameCatalog for RedisGameCatalog {
    async fn get(&self, game_id: &str) -> Result<Option<Game>> {
        let mut redis_conn = self.redis.clone();
        let raw: Option<String> = redis_conn.hget(games_catalog_key(), game_id).await?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Storage(format!("Corrupt catalog entry {}: {}", game_id, e))),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Game>> {
        let mut redis_conn = self.redis.clone();
        let raw: Vec<String> = redis_conn.hvals(games_catalog_key()).await?;

        let mut games = Vec::with_capacity(raw.len());
        for json in raw {
            let game: Game = serde_json::from_str(&json)
                .map_err(|e| AppError::Storage(format!("Corrupt catalog entry: {}", e)))?;
            games.push(game);
        }
        games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        Ok(games)
    }

    async fn upsert(&self, game: &Game) -> Result<()> {
        let mut redis_conn = self.redis.clone();
        let json = serde_json::to_string(game)
            .map_err(|e| AppError::Storage(format!("Failed to encode game: {}", e)))?;
        let _: () = redis_conn
            .hset(games_catalog_key(), &game.game_id, json)
            .await?;
        Ok(())
    }
}
