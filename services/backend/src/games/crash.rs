//! Crash game, synchronous model.
//!
//! The crash point is `1 + Exp(rate)` rounded to 2 decimals. The caller
//! commits to a cash-out target up front; the bet pays `bet x target` iff
//! the target does not exceed the crash point. No target means the player
//! rode the multiplier down, which always loses. The live/interactive
//! variant is out of scope.

use rand::Rng;
use shared::constants::CRASH_RATE;
use shared::{Amount, Multiplier};

use crate::domain::RoundOutcome;

use super::{GameError, RoundResolution};

/// Smallest accepted cash-out target (1.01x): a 1.00x target would be a
/// guaranteed break-even round.
const MIN_TARGET_BP: u64 = 10_100;

/// Draw a crash point from `1 + Exp(CRASH_RATE)`, rounded to centi-units.
pub fn sample_crash_point(rng: &mut impl Rng) -> Multiplier {
    let u: f64 = rng.gen();
    let exp = -(1.0 - u).ln() / CRASH_RATE;
    let crash = 1.0 + exp;
    Multiplier::from_centi((crash * 100.0).round() as u64)
}

/// Resolve a bet against a known crash point. Split out from `play` so the
/// boundary semantics are directly testable.
pub fn resolve(
    bet: Amount,
    target: Option<Multiplier>,
    crash_multiplier: Multiplier,
) -> Result<RoundResolution, GameError> {
    if let Some(t) = target {
        if t.as_bp() < MIN_TARGET_BP {
            return Err(GameError::InvalidTargetMultiplier);
        }
    }

    let won = matches!(target, Some(t) if t.as_bp() <= crash_multiplier.as_bp());
    let (win_amount, multiplier) = if won {
        let t = target.unwrap_or(Multiplier::ZERO);
        (bet.mul_bp(t.as_bp())?, t)
    } else {
        (Amount::ZERO, Multiplier::ZERO)
    };

    Ok(RoundResolution {
        win_amount,
        multiplier,
        outcome: RoundOutcome::Crash {
            crash_multiplier,
            target_multiplier: target,
        },
    })
}

pub fn play(
    bet: Amount,
    target: Option<Multiplier>,
    rng: &mut impl Rng,
) -> Result<RoundResolution, GameError> {
    resolve(bet, target, sample_crash_point(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_target_equal_to_crash_point_wins() {
        let result = resolve(
            Amount::from_minor(100),
            Some(Multiplier::from_centi(200)),
            Multiplier::from_centi(200),
        )
        .unwrap();
        assert!(result.is_winning());
        assert_eq!(result.win_amount, Amount::from_minor(200));
        assert_eq!(result.multiplier, Multiplier::from_centi(200));
    }

    #[test]
    fn test_target_above_crash_point_loses() {
        let result = resolve(
            Amount::from_minor(100),
            Some(Multiplier::from_centi(201)),
            Multiplier::from_centi(200),
        )
        .unwrap();
        assert!(!result.is_winning());
        assert_eq!(result.win_amount, Amount::ZERO);
        assert_eq!(result.multiplier, Multiplier::ZERO);
    }

    #[test]
    fn test_no_target_always_loses() {
        let result = resolve(
            Amount::from_minor(100),
            None,
            Multiplier::from_centi(10_000),
        )
        .unwrap();
        assert!(!result.is_winning());
    }

    #[test]
    fn test_sub_minimum_target_is_rejected() {
        let result = resolve(
            Amount::from_minor(100),
            Some(Multiplier::from_centi(100)),
            Multiplier::from_centi(500),
        );
        assert_eq!(result.unwrap_err(), GameError::InvalidTargetMultiplier);
    }

    #[test]
    fn test_crash_point_is_at_least_one() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let crash = sample_crash_point(&mut rng);
            assert!(crash.as_bp() >= Multiplier::ONE.as_bp());
        }
    }

    #[test]
    fn test_play_is_deterministic_under_a_seed() {
        let bet = Amount::from_minor(100);
        let target = Some(Multiplier::from_centi(150));
        let first = play(bet, target, &mut StdRng::seed_from_u64(9)).unwrap();
        let second = play(bet, target, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(first, second);
    }
}
