//! Two-dice over/under game.
//!
//! The sum of two uniform d6 is compared strictly against a target in
//! [2, 11]. Win probabilities are `(11 - t) / 36` for over and
//! `(t - 1) / 36` for under; the payout multiplier is `0.95 / p`, computed
//! exactly in integer basis points as `342000 / k`.

use rand::Rng;
use shared::constants::{DICE_OUTCOMES, DICE_RTP_BP};
use shared::{Amount, Multiplier};

use crate::domain::{DiceDirection, RoundOutcome};

use super::{GameError, RoundResolution};

pub const MIN_TARGET: u8 = 2;
pub const MAX_TARGET: u8 = 11;

/// Number of the 36 outcomes that win for a target/direction pair.
fn winning_outcomes(target: u8, direction: DiceDirection) -> Result<u64, GameError> {
    if !(MIN_TARGET..=MAX_TARGET).contains(&target) {
        return Err(GameError::TargetOutOfRange(target));
    }
    let k = match direction {
        DiceDirection::Over => (MAX_TARGET - target) as u64,
        DiceDirection::Under => (target - 1) as u64,
    };
    if k == 0 {
        // Over 11: no sum beats 11 when 12 is the maximum and the
        // comparison is strict against [2, 11].
        return Err(GameError::ImpossibleTarget);
    }
    Ok(k)
}

/// Payout multiplier in basis points, truncating toward zero.
pub fn payout_multiplier_bp(target: u8, direction: DiceDirection) -> Result<u64, GameError> {
    let k = winning_outcomes(target, direction)?;
    Ok(DICE_RTP_BP * DICE_OUTCOMES / k)
}

/// Resolve a bet against known dice. Split out from `roll` so the payout
/// table is directly testable.
pub fn resolve(
    bet: Amount,
    target: u8,
    direction: DiceDirection,
    die1: u8,
    die2: u8,
) -> Result<RoundResolution, GameError> {
    let payout_bp = payout_multiplier_bp(target, direction)?;
    let total = die1 + die2;

    let won = match direction {
        DiceDirection::Over => total > target,
        DiceDirection::Under => total < target,
    };

    let (win_amount, multiplier) = if won {
        (bet.mul_bp(payout_bp)?, Multiplier::from_bp(payout_bp))
    } else {
        (Amount::ZERO, Multiplier::ZERO)
    };

    Ok(RoundResolution {
        win_amount,
        multiplier,
        outcome: RoundOutcome::Dice {
            die1,
            die2,
            total,
            target,
            direction,
        },
    })
}

pub fn roll(
    bet: Amount,
    target: u8,
    direction: DiceDirection,
    rng: &mut impl Rng,
) -> Result<RoundResolution, GameError> {
    let die1 = rng.gen_range(1..=6);
    let die2 = rng.gen_range(1..=6);
    resolve(bet, target, direction, die1, die2)
}
