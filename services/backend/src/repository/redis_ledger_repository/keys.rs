//! Redis key generation functions
//!
//! Centralizes all Redis key patterns used for wallet, transaction, session
//! and catalog storage.

use uuid::Uuid;

const WALLET_KEY_PREFIX: &str = "wallet:";
const TX_KEY_PREFIX: &str = "tx:";
const TX_USER_INDEX_PREFIX: &str = "tx:user:";
const TX_EXTERNAL_INDEX_PREFIX: &str = "tx:external:";
const TX_PENDING_INDEX: &str = "tx:pending";
const SESSION_KEY_PREFIX: &str = "session:";
const RESULT_KEY_PREFIX: &str = "result:";
const GAMES_CATALOG: &str = "games:catalog";

pub fn wallet_key(user_id: &str) -> String {
    format!("{}{}", WALLET_KEY_PREFIX, user_id)
}

pub fn tx_key(transaction_id: Uuid) -> String {
    format!("{}{}", TX_KEY_PREFIX, transaction_id)
}

/// Sorted set of a user's transaction ids, scored by creation time.
pub fn tx_user_index_key(user_id: &str) -> String {
    format!("{}{}", TX_USER_INDEX_PREFIX, user_id)
}

/// Idempotency lookup: maps a caller-supplied external id to a transaction.
pub fn tx_external_index_key(user_id: &str, external_id: &str) -> String {
    format!("{}{}:{}", TX_EXTERNAL_INDEX_PREFIX, user_id, external_id)
}

/// Sorted set of pending transaction ids, scored by creation time. The
/// reconciliation sweep range-scans it by age.
pub fn tx_pending_index_key() -> &'static str {
    TX_PENDING_INDEX
}

pub fn session_key(session_id: Uuid) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

pub fn result_key(result_id: Uuid) -> String {
    format!("{}{}", RESULT_KEY_PREFIX, result_id)
}

/// Sorted set of a session's result ids, scored by creation time.
pub fn session_results_index_key(session_id: Uuid) -> String {
    format!("{}{}:results", SESSION_KEY_PREFIX, session_id)
}

pub fn games_catalog_key() -> &'static str {
    GAMES_CATALOG
}
