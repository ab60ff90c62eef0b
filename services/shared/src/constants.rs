/// Shared constants for the wallet ledger and gaming core
///
/// Centralizes all magic numbers so the backend service, tests and any
/// future settlement tooling agree on the same values.

/// Minor units per whole currency unit (2 decimal places for both INR and HC)
pub const MINOR_UNITS_PER_WHOLE: i64 = 100;

/// Basis points per 1.0x multiplier (4 decimal places of payout precision)
pub const BASIS_POINTS_PER_UNIT: u64 = 10_000;

/// Fixed conversion rate: whole INR per whole HC (1 HC = 1000 INR)
///
/// Rationale: the platform token is pegged by configuration, not by live
/// market data, so conversion math is deterministic and exactly invertible
/// up to minor-unit truncation.
pub const DEFAULT_HC_TO_INR_RATE: i64 = 1_000;

/// Welcome bonus granted after a user's first completed deposit (1.00 HC)
pub const WELCOME_BONUS_HC_MINOR: i64 = 100;

/// Minimum deposit amount in minor INR units (100.00 INR)
///
/// Rationale: below this, payment-gateway fees consume a meaningful share
/// of the deposit.
pub const MIN_DEPOSIT_INR_MINOR: i64 = 10_000;

/// Minimum withdrawal amount in minor INR units (500.00 INR)
pub const MIN_WITHDRAWAL_INR_MINOR: i64 = 50_000;

/// Numerator of every dice payout, in basis points (0.95 = 5% house edge)
pub const DICE_RTP_BP: u64 = 9_500;

/// Total equally-likely outcomes for two six-sided dice
pub const DICE_OUTCOMES: u64 = 36;

/// Rate parameter of the exponential crash-point distribution
pub const CRASH_RATE: f64 = 0.5;

/// Free spins granted per bonus symbol landing on the slot payline
pub const FREE_SPINS_PER_BONUS_SYMBOL: u32 = 5;

/// Default page size for transaction history queries
pub const DEFAULT_TRANSACTION_PAGE_SIZE: usize = 50;

/// Maximum page size for transaction history queries
pub const MAX_TRANSACTION_PAGE_SIZE: usize = 100;

/// Age after which a still-pending transaction is considered orphaned
/// and eligible for the reconciliation sweep (seconds)
pub const PENDING_TRANSACTION_MAX_AGE_SECS: i64 = 300;
