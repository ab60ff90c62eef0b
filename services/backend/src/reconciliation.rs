//! Background sweep for orphaned pending transactions.
//!
//! Settlement writes the balance mutation and the status flip in one atomic
//! unit, so a row still pending after the cutoff means its mutation was
//! never applied. The sweep marks such rows failed; nothing is replayed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::ReconciliationConfig;
use crate::repository::LedgerRepository;

const SWEEP_BATCH_SIZE: usize = 100;

/// Mark pending transactions older than the configured age as failed.
/// Returns the number of rows swept.
pub async fn sweep_stale_pending(
    ledger: &dyn LedgerRepository,
    config: &ReconciliationConfig,
) -> anyhow::Result<usize> {
    let cutoff = Utc::now() - chrono::Duration::seconds(config.pending_max_age_secs);
    let stale = ledger.find_stale_pending(cutoff, SWEEP_BATCH_SIZE).await?;

    if stale.is_empty() {
        return Ok(0);
    }

    tracing::info!("Found {} stale pending transactions to sweep", stale.len());

    let mut swept = 0;
    for tx in stale {
        match ledger
            .mark_transaction_failed(tx.transaction_id, "Abandoned before settlement")
            .await
        {
            Ok(()) => {
                tracing::warn!(
                    transaction_id = %tx.transaction_id,
                    user_id = %tx.user_id,
                    kind = ?tx.kind,
                    amount = %tx.amount,
                    "Swept stale pending transaction"
                );
                metrics::counter!("reconciliation_swept_total").increment(1);
                swept += 1;
            }
            Err(err) => {
                tracing::error!(
                    transaction_id = %tx.transaction_id,
                    error = %err,
                    "Failed to sweep stale pending transaction"
                );
                metrics::counter!("reconciliation_errors_total").increment(1);
            }
        }
    }

    Ok(swept)
}

/// Run the sweep on an interval until the process exits.
pub async fn run_sweeper(ledger: Arc<dyn LedgerRepository>, config: ReconciliationConfig) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(err) = sweep_stale_pending(ledger.as_ref(), &config).await {
            tracing::error!(error = %err, "Reconciliation sweep failed");
            metrics::counter!("reconciliation_errors_total").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Transaction, TransactionKind, TransactionStatus};
    use crate::repository::MemoryLedgerRepository;
    use shared::{Amount, Currency};
    use uuid::Uuid;

    fn pending_tx(user_id: &str, age_secs: i64) -> Transaction {
        let created = Utc::now() - chrono::Duration::seconds(age_secs);
        Transaction {
            transaction_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            wallet_id: Uuid::new_v4(),
            kind: TransactionKind::Deposit,
            status: TransactionStatus::Pending,
            currency: Currency::Inr,
            amount: Amount::from_minor(10_000),
            balance_before: Amount::ZERO,
            balance_after: None,
            external_id: None,
            payment_method: None,
            description: "Deposit via UPI".to_string(),
            created_at: created,
            updated_at: created,
        }
    }

    #[tokio::test]
    async fn test_sweep_fails_only_rows_past_the_cutoff() {
        let ledger = MemoryLedgerRepository::new();
        ledger.get_or_create_wallet("user-1").await.unwrap();

        let old = pending_tx("user-1", 600);
        let fresh = pending_tx("user-1", 10);
        ledger.insert_transaction(&old).await.unwrap();
        ledger.insert_transaction(&fresh).await.unwrap();

        let config = ReconciliationConfig {
            sweep_interval_secs: 60,
            pending_max_age_secs: 300,
        };
        let swept = sweep_stale_pending(&ledger, &config).await.unwrap();
        assert_eq!(swept, 1);

        let old_row = ledger
            .find_transaction(old.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old_row.status, TransactionStatus::Failed);

        let fresh_row = ledger
            .find_transaction(fresh.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh_row.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_is_a_noop_when_nothing_is_stale() {
        let ledger = MemoryLedgerRepository::new();
        let config = ReconciliationConfig {
            sweep_interval_secs: 60,
            pending_max_age_secs: 300,
        };
        assert_eq!(sweep_stale_pending(&ledger, &config).await.unwrap(), 0);
    }
}
