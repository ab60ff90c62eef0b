//! Wallet ledger operations.
//!
//! Every money movement follows the same protocol: write a `Pending`
//! transaction first, then settle it (balance mutation + completion in one
//! atomic repository call), and mark it `Failed` if the settle errored. The
//! service layer never reads a balance and writes it back.

use std::sync::Arc;

use chrono::Utc;
use shared::{Amount, Currency};
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::domain::{
    BalanceChange, DepositRequest, PaymentMethod, Transaction, TransactionKind,
    TransactionStatus, Wallet, WithdrawalRequest,
};
use crate::errors::{AppError, Result};
use crate::repository::LedgerRepository;

pub struct WalletService {
    ledger: Arc<dyn LedgerRepository>,
    config: WalletConfig,
}

impl WalletService {
    pub fn new(ledger: Arc<dyn LedgerRepository>, config: WalletConfig) -> Self {
        Self { ledger, config }
    }

    pub async fn get_or_create_wallet(&self, user_id: &str) -> Result<Wallet> {
        self.ledger.get_or_create_wallet(user_id).await
    }

    /// Atomic conditional balance mutation; the repository serializes
    /// per-user access and rejects overdrafts.
    pub async fn update_balance(
        &self,
        user_id: &str,
        delta: Amount,
        currency: Currency,
        kind: TransactionKind,
    ) -> Result<BalanceChange> {
        self.ledger.apply_balance(user_id, delta, currency, kind).await
    }

    /// Write a `Pending` ledger row capturing the current balance.
    pub async fn create_transaction(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: Amount,
        currency: Currency,
        payment_method: Option<PaymentMethod>,
        external_id: Option<String>,
        description: String,
    ) -> Result<Transaction> {
        let wallet = self
            .ledger
            .get_wallet(user_id)
            .await?
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;

        let now = Utc::now();
        let tx = Transaction {
            transaction_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            wallet_id: wallet.wallet_id,
            kind,
            amount,
            currency,
            status: TransactionStatus::Pending,
            payment_method,
            external_id,
            balance_before: wallet.balance(currency),
            balance_after: None,
            description,
            created_at: now,
            updated_at: now,
        };
        self.ledger.insert_transaction(&tx).await?;
        Ok(tx)
    }

    /// Settle a pending row; on failure mark it `Failed` and re-raise.
    async fn settle_or_fail(&self, tx: &Transaction) -> Result<Transaction> {
        match self
            .ledger
            .settle_transaction(tx.transaction_id, &tx.user_id, tx.amount, tx.currency, tx.kind)
            .await
        {
            Ok(change) => Ok(completed(tx, change)),
            Err(e) => {
                self.ledger
                    .mark_transaction_failed(tx.transaction_id, &e.to_string())
                    .await?;
                Err(e)
            }
        }
    }

    /// Atomically claim the pending row's external id. The read-based replay
    /// check above it is only a fast path; this claim is what serializes two
    /// concurrent requests carrying the same external id. On a lost claim the
    /// pending row is failed and the winning transaction returned.
    async fn claim_or_replay(&self, pending: &Transaction) -> Result<Option<Transaction>> {
        let Some(external_id) = &pending.external_id else {
            return Ok(None);
        };

        let owner = self
            .ledger
            .claim_external_id(&pending.user_id, external_id, pending.transaction_id)
            .await?;
        if owner == pending.transaction_id {
            return Ok(None);
        }

        self.ledger
            .mark_transaction_failed(pending.transaction_id, "Duplicate external id")
            .await?;
        tracing::info!(
            transaction_id = %owner,
            external_id = %external_id,
            "Concurrent replay lost the external id claim"
        );
        let winner = self
            .ledger
            .find_transaction(owner)
            .await?
            .ok_or_else(|| {
                AppError::Storage(format!("Replayed transaction {owner} is not yet visible"))
            })?;
        Ok(Some(winner))
    }

    pub async fn process_deposit(
        &self,
        user_id: &str,
        req: DepositRequest,
    ) -> Result<Transaction> {
        tracing::debug!(user_id = %user_id, amount = %req.amount, "Processing deposit");

        if req.amount < self.config.min_deposit {
            return Err(AppError::Validation(format!(
                "Minimum deposit is {} INR",
                self.config.min_deposit
            )));
        }

        self.ledger.get_or_create_wallet(user_id).await?;

        // Idempotency: a replay with the same external id returns the
        // original transaction instead of moving money twice.
        if let Some(external_id) = &req.external_id {
            if let Some(existing) = self
                .ledger
                .find_by_external_id(user_id, external_id)
                .await?
            {
                tracing::info!(
                    transaction_id = %existing.transaction_id,
                    external_id = %external_id,
                    "Deposit replay matched an existing transaction"
                );
                return Ok(existing);
            }
        }

        let pending = self
            .create_transaction(
                user_id,
                TransactionKind::Deposit,
                req.amount,
                Currency::Inr,
                Some(req.payment_method),
                req.external_id.clone(),
                format!("Deposit of {} INR", req.amount),
            )
            .await?;
        if let Some(winner) = self.claim_or_replay(&pending).await? {
            return Ok(winner);
        }

        let tx = self.settle_or_fail(&pending).await?;

        tracing::info!(transaction_id = %tx.transaction_id, "Deposit completed");
        metrics::counter!("deposits_completed_total").increment(1);

        if self.ledger.claim_welcome_bonus(user_id).await? {
            self.grant_welcome_bonus(user_id).await?;
        }

        Ok(tx)
    }

    /// One-time bonus after the first completed deposit. The claim flag is
    /// flipped atomically before this runs, so concurrent first deposits
    /// grant at most one bonus.
    async fn grant_welcome_bonus(&self, user_id: &str) -> Result<Transaction> {
        let pending = self
            .create_transaction(
                user_id,
                TransactionKind::WelcomeBonus,
                self.config.welcome_bonus,
                Currency::Hc,
                None,
                None,
                format!("Welcome bonus of {} HC", self.config.welcome_bonus),
            )
            .await?;
        let tx = self.settle_or_fail(&pending).await?;

        tracing::info!(user_id = %user_id, "Welcome bonus granted");
        metrics::counter!("welcome_bonus_granted_total").increment(1);
        Ok(tx)
    }

    pub async fn process_withdrawal(
        &self,
        user_id: &str,
        req: WithdrawalRequest,
    ) -> Result<Transaction> {
        tracing::debug!(user_id = %user_id, amount = %req.amount, "Processing withdrawal");

        if req.amount < self.config.min_withdrawal {
            return Err(AppError::Validation(format!(
                "Minimum withdrawal is {} INR",
                self.config.min_withdrawal
            )));
        }

        let wallet = self
            .ledger
            .get_wallet(user_id)
            .await?
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;

        // Replay check runs before the balance precheck: a retry of an
        // already-settled withdrawal sees the reduced balance and must
        // still return the original transaction.
        if let Some(external_id) = &req.external_id {
            if let Some(existing) = self
                .ledger
                .find_by_external_id(user_id, external_id)
                .await?
            {
                tracing::info!(
                    transaction_id = %existing.transaction_id,
                    external_id = %external_id,
                    "Withdrawal replay matched an existing transaction"
                );
                return Ok(existing);
            }
        }

        // Precheck so an obviously short balance never writes a debit row.
        if wallet.inr_balance < req.amount {
            return Err(AppError::InsufficientFunds {
                required: req.amount,
                available: wallet.inr_balance,
            });
        }

        let pending = self
            .create_transaction(
                user_id,
                TransactionKind::Withdrawal,
                req.amount.checked_neg()?,
                Currency::Inr,
                Some(req.payment_method),
                req.external_id.clone(),
                format!("Withdrawal of {} INR", req.amount),
            )
            .await?;
        if let Some(winner) = self.claim_or_replay(&pending).await? {
            return Ok(winner);
        }

        let tx = self.settle_or_fail(&pending).await?;

        tracing::info!(transaction_id = %tx.transaction_id, "Withdrawal completed");
        metrics::counter!("withdrawals_completed_total").increment(1);
        Ok(tx)
    }

    pub async fn convert_currency(
        &self,
        user_id: &str,
        amount: Amount,
        from: Currency,
        to: Currency,
    ) -> Result<Transaction> {
        tracing::debug!(
            user_id = %user_id,
            amount = %amount,
            from = %from,
            to = %to,
            "Processing conversion"
        );

        if from == to {
            return Err(AppError::InvalidConversion { from, to });
        }
        if !amount.is_positive() {
            return Err(AppError::Validation(
                "Conversion amount must be positive".to_string(),
            ));
        }

        let (kind, credit) = match (from, to) {
            (Currency::Inr, Currency::Hc) => {
                let credit = amount.div_rate(self.config.hc_to_inr_rate)?;
                if credit.is_zero() {
                    return Err(AppError::Validation(format!(
                        "{} INR is below the smallest convertible unit",
                        amount
                    )));
                }
                (TransactionKind::ConversionInrToHc, credit)
            }
            (Currency::Hc, Currency::Inr) => (
                TransactionKind::ConversionHcToInr,
                amount.mul_rate(self.config.hc_to_inr_rate)?,
            ),
            _ => return Err(AppError::InvalidConversion { from, to }),
        };

        let wallet = self
            .ledger
            .get_wallet(user_id)
            .await?
            .ok_or_else(|| AppError::WalletNotFound(user_id.to_string()))?;
        if wallet.balance(from) < amount {
            return Err(AppError::InsufficientFunds {
                required: amount,
                available: wallet.balance(from),
            });
        }

        let pending = self
            .create_transaction(
                user_id,
                kind,
                amount.checked_neg()?,
                from,
                None,
                None,
                format!("Converted {} {} to {} {}", amount, from, credit, to),
            )
            .await?;

        match self
            .ledger
            .settle_conversion(pending.transaction_id, user_id, amount, from, credit, to)
            .await
        {
            Ok(change) => {
                tracing::info!(
                    transaction_id = %pending.transaction_id,
                    "Conversion completed"
                );
                metrics::counter!("conversions_completed_total").increment(1);
                Ok(completed(&pending, change))
            }
            Err(e) => {
                self.ledger
                    .mark_transaction_failed(pending.transaction_id, &e.to_string())
                    .await?;
                Err(e)
            }
        }
    }

    /// Debit a wager stake through the ledger. `InsufficientFunds` leaves a
    /// `Failed` row behind; no balance moves.
    pub async fn place_bet(
        &self,
        user_id: &str,
        amount: Amount,
        description: String,
    ) -> Result<Transaction> {
        let pending = self
            .create_transaction(
                user_id,
                TransactionKind::BetPlaced,
                amount.checked_neg()?,
                Currency::Hc,
                None,
                None,
                description,
            )
            .await?;
        self.settle_or_fail(&pending).await
    }

    /// Credit a round's winnings through the ledger.
    pub async fn credit_win(
        &self,
        user_id: &str,
        amount: Amount,
        description: String,
    ) -> Result<Transaction> {
        let pending = self
            .create_transaction(
                user_id,
                TransactionKind::BetWon,
                amount,
                Currency::Hc,
                None,
                None,
                description,
            )
            .await?;
        self.settle_or_fail(&pending).await
    }

    pub async fn get_transactions(
        &self,
        user_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let limit = limit.min(shared::constants::MAX_TRANSACTION_PAGE_SIZE);
        self.ledger.list_transactions(user_id, offset, limit).await
    }
}

fn completed(tx: &Transaction, change: BalanceChange) -> Transaction {
    Transaction {
        status: TransactionStatus::Completed,
        balance_before: change.before,
        balance_after: Some(change.after),
        updated_at: Utc::now(),
        ..tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryLedgerRepository;

    fn service() -> WalletService {
        WalletService::new(
            Arc::new(MemoryLedgerRepository::new()),
            WalletConfig::default(),
        )
    }

    fn deposit(amount_minor: i64, external_id: Option<&str>) -> DepositRequest {
        DepositRequest {
            amount: Amount::from_minor(amount_minor),
            payment_method: PaymentMethod::Upi,
            external_id: external_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_first_deposit_grants_welcome_bonus() {
        let svc = service();

        let tx = svc
            .process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.balance_after, Some(Amount::from_minor(500_000)));

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::from_minor(500_000));
        assert_eq!(wallet.hc_balance, Amount::from_minor(100));
        assert!(wallet.welcome_bonus_claimed);

        // A second deposit does not grant another bonus.
        svc.process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();
        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.hc_balance, Amount::from_minor(100));
    }

    #[tokio::test]
    async fn test_deposit_below_minimum_is_rejected() {
        let svc = service();
        let result = svc.process_deposit("user-1", deposit(9_999, None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deposit_replay_is_idempotent() {
        let svc = service();

        let first = svc
            .process_deposit("user-1", deposit(500_000, Some("pay-1")))
            .await
            .unwrap();
        let replay = svc
            .process_deposit("user-1", deposit(500_000, Some("pay-1")))
            .await
            .unwrap();

        assert_eq!(first.transaction_id, replay.transaction_id);
        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::from_minor(500_000));
    }

    #[tokio::test]
    async fn test_withdrawal_precheck_writes_no_debit_row() {
        let svc = service();
        svc.process_deposit("user-1", deposit(60_000, None))
            .await
            .unwrap();

        let result = svc
            .process_withdrawal(
                "user-1",
                WithdrawalRequest {
                    amount: Amount::from_minor(100_000),
                    payment_method: PaymentMethod::BankTransfer,
                    external_id: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

        // Only the deposit (and no withdrawal attempt) is in the history.
        let history = svc.get_transactions("user-1", 0, 50).await.unwrap();
        assert!(history
            .iter()
            .all(|t| t.kind != TransactionKind::Withdrawal));
    }

    #[tokio::test]
    async fn test_withdrawal_debits_and_completes() {
        let svc = service();
        svc.process_deposit("user-1", deposit(200_000, None))
            .await
            .unwrap();

        let tx = svc
            .process_withdrawal(
                "user-1",
                WithdrawalRequest {
                    amount: Amount::from_minor(50_000),
                    payment_method: PaymentMethod::BankTransfer,
                    external_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(tx.amount, Amount::from_minor(-50_000));
        assert_eq!(tx.balance_after, Some(Amount::from_minor(150_000)));

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.total_withdrawn, Amount::from_minor(50_000));
    }

    #[tokio::test]
    async fn test_withdrawal_replay_is_idempotent() {
        let svc = service();
        svc.process_deposit("user-1", deposit(100_000, None))
            .await
            .unwrap();

        let request = WithdrawalRequest {
            amount: Amount::from_minor(100_000),
            payment_method: PaymentMethod::BankTransfer,
            external_id: Some("wd-1".to_string()),
        };
        let first = svc
            .process_withdrawal("user-1", request.clone())
            .await
            .unwrap();
        assert_eq!(first.status, TransactionStatus::Completed);

        // The retry arrives after the balance already dropped to zero; it
        // must return the original transaction, not InsufficientFunds.
        let replay = svc.process_withdrawal("user-1", request).await.unwrap();
        assert_eq!(first.transaction_id, replay.transaction_id);

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::ZERO);
        assert_eq!(wallet.total_withdrawn, Amount::from_minor(100_000));
    }

    #[tokio::test]
    async fn test_concurrent_deposits_with_one_external_id_credit_once() {
        let svc = Arc::new(service());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.process_deposit("user-1", deposit(500_000, Some("pay-race")))
                    .await
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().transaction_id);
        }

        // Every caller observed the same transaction and the balance was
        // credited exactly once.
        assert!(ids.iter().all(|id| *id == ids[0]));
        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::from_minor(500_000));
    }

    #[tokio::test]
    async fn test_conversion_round_trip_is_exact_at_the_fixed_rate() {
        let svc = service();
        svc.process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();

        // 5000.00 INR -> 5.00 HC.
        let to_hc = svc
            .convert_currency(
                "user-1",
                Amount::from_minor(500_000),
                Currency::Inr,
                Currency::Hc,
            )
            .await
            .unwrap();
        assert_eq!(to_hc.kind, TransactionKind::ConversionInrToHc);

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::ZERO);
        // 5.00 HC plus the 1.00 HC welcome bonus.
        assert_eq!(wallet.hc_balance, Amount::from_minor(600));

        // 5.00 HC -> 5000.00 INR.
        svc.convert_currency(
            "user-1",
            Amount::from_minor(500),
            Currency::Hc,
            Currency::Inr,
        )
        .await
        .unwrap();

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.inr_balance, Amount::from_minor(500_000));
        assert_eq!(wallet.hc_balance, Amount::from_minor(100));
    }

    #[tokio::test]
    async fn test_conversion_rejects_same_currency_pair() {
        let svc = service();
        svc.process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();

        let result = svc
            .convert_currency(
                "user-1",
                Amount::from_minor(100),
                Currency::Inr,
                Currency::Inr,
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidConversion { .. })));
    }

    #[tokio::test]
    async fn test_conversion_of_dust_is_rejected() {
        let svc = service();
        svc.process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();

        // 5.00 INR converts to zero minor HC units at rate 1000.
        let result = svc
            .convert_currency(
                "user-1",
                Amount::from_minor(500),
                Currency::Inr,
                Currency::Hc,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_place_bet_with_short_balance_fails_and_marks_row() {
        let svc = service();
        svc.process_deposit("user-1", deposit(500_000, None))
            .await
            .unwrap();
        // Balance is the 1.00 HC welcome bonus; stake 2.00 HC.
        let result = svc
            .place_bet("user-1", Amount::from_minor(200), "Bet on dice".to_string())
            .await;
        assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

        let history = svc.get_transactions("user-1", 0, 50).await.unwrap();
        let bet_row = history
            .iter()
            .find(|t| t.kind == TransactionKind::BetPlaced)
            .unwrap();
        assert_eq!(bet_row.status, TransactionStatus::Failed);

        let wallet = svc.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(wallet.hc_balance, Amount::from_minor(100));
    }

    #[tokio::test]
    async fn test_transaction_history_is_newest_first() {
        let svc = service();
        svc.process_deposit("user-1", deposit(500_000, Some("a")))
            .await
            .unwrap();
        svc.process_deposit("user-1", deposit(600_000, Some("b")))
            .await
            .unwrap();

        let history = svc.get_transactions("user-1", 0, 50).await.unwrap();
        let deposits: Vec<&Transaction> = history
            .iter()
            .filter(|t| t.kind == TransactionKind::Deposit)
            .collect();
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].external_id.as_deref(), Some("b"));
        assert_eq!(deposits[1].external_id.as_deref(), Some("a"));
    }
}
