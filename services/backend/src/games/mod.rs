//! Pure game outcome engines.
//!
//! No I/O and no clocks: randomness comes in as `&mut impl Rng`, so any
//! round is replayable given the same draws. All payout math is integer
//! basis-point arithmetic truncating toward zero at minor-unit precision.

pub mod crash;
pub mod dice;
pub mod slots;

use shared::{Amount, AmountError, Multiplier};
use thiserror::Error;

use crate::domain::RoundOutcome;
use crate::errors::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Dice target must be between 2 and 11, got {0}")]
    TargetOutOfRange(u8),

    #[error("Over 11 can never win")]
    ImpossibleTarget,

    #[error("Crash target multiplier must be at least 1.01")]
    InvalidTargetMultiplier,

    #[error("Payout arithmetic overflow")]
    Overflow,
}

impl From<AmountError> for GameError {
    fn from(_: AmountError) -> Self {
        GameError::Overflow
    }
}

impl From<GameError> for AppError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::Overflow => {
                AppError::Internal(anyhow::anyhow!("Payout arithmetic overflow"))
            }
            other => AppError::InvalidBetAmount(other.to_string()),
        }
    }
}

/// The resolved round: what it pays and what the engine observed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResolution {
    pub win_amount: Amount,
    /// Paid multiplier in basis points; zero on a loss.
    pub multiplier: Multiplier,
    pub outcome: RoundOutcome,
}

impl RoundResolution {
    pub fn is_winning(&self) -> bool {
        self.win_amount.is_positive()
    }
}
