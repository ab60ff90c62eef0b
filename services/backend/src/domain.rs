use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Amount, Currency, Multiplier};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Ledger transaction kinds. Conversion carries its direction in the kind so
/// a single row fully describes the operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    BetPlaced,
    BetWon,
    WelcomeBonus,
    ConversionInrToHc,
    ConversionHcToInr,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Card,
    BankTransfer,
    Crypto,
}

/// A user's wallet. Both balances are invariantly non-negative; the lifetime
/// counters only ever grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: Uuid,
    pub user_id: String,
    pub inr_balance: Amount,
    pub hc_balance: Amount,
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
    pub total_bet_amount: Amount,
    pub total_winnings: Amount,
    pub welcome_bonus_claimed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            wallet_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            inr_balance: Amount::ZERO,
            hc_balance: Amount::ZERO,
            total_deposited: Amount::ZERO,
            total_withdrawn: Amount::ZERO,
            total_bet_amount: Amount::ZERO,
            total_winnings: Amount::ZERO,
            welcome_bonus_claimed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Inr => self.inr_balance,
            Currency::Hc => self.hc_balance,
        }
    }
}

/// A ledger row. Written `Pending` before any balance mutation; the mutation
/// and the flip to `Completed` happen in one atomic storage operation, so an
/// old `Pending` row always means the mutation never applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub kind: TransactionKind,
    /// Signed delta in minor units: negative for debits.
    pub amount: Amount,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Idempotency key supplied by the payment collaborator.
    pub external_id: Option<String>,
    pub balance_before: Amount,
    pub balance_after: Option<Amount>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authoritative balance snapshot returned by an atomic balance mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceChange {
    pub before: Amount,
    pub after: Amount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

/// A play session for one game. Exclusively owned by its user; all wagers in
/// a session are denominated in HC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: Uuid,
    pub user_id: String,
    pub game_id: String,
    pub currency: Currency,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_spins: u32,
    pub total_bet: Amount,
    pub total_winnings: Amount,
}

impl GameSession {
    pub fn new(user_id: &str, game_id: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            game_id: game_id.to_string(),
            currency: Currency::Hc,
            status: SessionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            total_spins: 0,
            total_bet: Amount::ZERO,
            total_winnings: Amount::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SlotSymbol {
    CricketBat,
    CricketBall,
    Stumps,
    Trophy,
    Helmet,
    Gloves,
    HappyCoin,
    Seven,
    Cherry,
    Bell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiceDirection {
    Over,
    Under,
}

/// Caller-supplied parameters for one round, discriminated by game family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum RoundParams {
    Slots,
    Crash {
        /// 2-decimal cash-out multiplier; absent means the player never
        /// cashed out, which is always a loss in the synchronous model.
        target_multiplier: Option<f64>,
    },
    Dice {
        target: u8,
        direction: DiceDirection,
    },
}

/// Everything the engine observed while resolving a round. Serialized into
/// the write-once GameResult and echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum RoundOutcome {
    Slots {
        /// 5 reels of 3 symbols each, column-major.
        reels: Vec<Vec<SlotSymbol>>,
        /// Middle row, the only evaluated payline.
        payline: Vec<SlotSymbol>,
        bonus_triggered: bool,
        free_spins_awarded: u32,
    },
    Crash {
        crash_multiplier: Multiplier,
        target_multiplier: Option<Multiplier>,
    },
    Dice {
        die1: u8,
        die2: u8,
        total: u8,
        target: u8,
        direction: DiceDirection,
    },
}

/// Write-once record of a resolved round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub result_id: Uuid,
    pub session_id: Uuid,
    pub user_id: String,
    pub game_id: String,
    pub bet_amount: Amount,
    pub win_amount: Amount,
    /// Paid multiplier in basis points; zero on a loss.
    pub multiplier: Multiplier,
    pub outcome: RoundOutcome,
    pub is_winning: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    SlotMachine,
    CrashGame,
    Dice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Inactive,
    Maintenance,
}

/// Catalog entry. The catalog is referenced, never owned: sessions validate
/// against it but wallet math never depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub name: String,
    pub game_type: GameType,
    /// Wager bounds in minor HC units.
    pub min_bet: Amount,
    pub max_bet: Amount,
    /// Informational only; payout math derives from the engines.
    pub rtp_percentage: f64,
    pub status: GameStatus,
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

fn validate_positive_amount(amount: &Amount) -> Result<(), ValidationError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_positive"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DepositRequest {
    /// Amount in minor INR units.
    #[validate(custom = "validate_positive_amount")]
    pub amount: Amount,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 128))]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WithdrawalRequest {
    /// Amount in minor INR units.
    #[validate(custom = "validate_positive_amount")]
    pub amount: Amount,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 128))]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConvertRequest {
    /// Amount in minor units of the source currency.
    #[validate(custom = "validate_positive_amount")]
    pub amount: Amount,
    pub from_currency: Currency,
    pub to_currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub game_id: String,
    /// Intended stake in minor HC units, checked against the game bounds
    /// and the caller's balance up front.
    #[validate(custom = "validate_positive_amount")]
    pub bet_amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlayRoundRequest {
    #[validate(custom = "validate_positive_amount")]
    pub bet_amount: Amount,
    #[serde(flatten)]
    pub params: RoundParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResponse {
    pub result: GameResult,
    pub session: GameSession,
    pub hc_balance: Amount,
}
