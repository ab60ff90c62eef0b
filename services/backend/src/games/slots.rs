//! Cricket-themed slot machine: 5 reels, 3 rows, middle-row payline.
//!
//! Each of the 15 positions is drawn independently from the weighted symbol
//! table. Five of a kind on the payline pays the symbol value; the first
//! three matching pays half; anything else pays nothing. HappyCoin symbols
//! on the payline trigger the free-spin bonus regardless of payout.

use rand::Rng;
use shared::constants::FREE_SPINS_PER_BONUS_SYMBOL;
use shared::{Amount, Multiplier};

use crate::domain::{RoundOutcome, SlotSymbol};

use super::{GameError, RoundResolution};

pub const REELS: usize = 5;
pub const ROWS: usize = 3;
const PAYLINE_ROW: usize = 1;

/// (symbol, draw weight, payout value in basis points of the bet).
const SYMBOL_TABLE: [(SlotSymbol, u32, u64); 10] = [
    (SlotSymbol::CricketBat, 8, 20_000),
    (SlotSymbol::CricketBall, 8, 20_000),
    (SlotSymbol::Stumps, 6, 30_000),
    (SlotSymbol::Trophy, 4, 50_000),
    (SlotSymbol::Helmet, 6, 30_000),
    (SlotSymbol::Gloves, 8, 20_000),
    (SlotSymbol::HappyCoin, 2, 100_000),
    (SlotSymbol::Seven, 1, 250_000),
    (SlotSymbol::Cherry, 10, 15_000),
    (SlotSymbol::Bell, 5, 40_000),
];

const TOTAL_WEIGHT: u32 = 58;

fn symbol_value_bp(symbol: SlotSymbol) -> u64 {
    SYMBOL_TABLE
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|(_, _, value)| *value)
        .unwrap_or(0)
}

fn draw_symbol(rng: &mut impl Rng) -> SlotSymbol {
    let mut roll = rng.gen_range(0..TOTAL_WEIGHT);
    for (symbol, weight, _) in SYMBOL_TABLE {
        if roll < weight {
            return symbol;
        }
        roll -= weight;
    }
    // Unreachable: weights sum to TOTAL_WEIGHT.
    SlotSymbol::Cherry
}

/// Payout multiplier (basis points) for a payline, ignoring bonuses.
pub fn payline_multiplier_bp(payline: &[SlotSymbol]) -> u64 {
    let first = payline[0];
    if payline.iter().all(|s| *s == first) {
        symbol_value_bp(first)
    } else if payline.len() >= 3 && payline[1] == first && payline[2] == first {
        symbol_value_bp(first) / 2
    } else {
        0
    }
}

/// Spin the reels and resolve the bet.
pub fn spin(bet: Amount, rng: &mut impl Rng) -> Result<RoundResolution, GameError> {
    let reels: Vec<Vec<SlotSymbol>> = (0..REELS)
        .map(|_| (0..ROWS).map(|_| draw_symbol(rng)).collect())
        .collect();
    let payline: Vec<SlotSymbol> = reels.iter().map(|reel| reel[PAYLINE_ROW]).collect();

    let multiplier_bp = payline_multiplier_bp(&payline);
    let win_amount = bet.mul_bp(multiplier_bp)?;

    let bonus_symbols = payline
        .iter()
        .filter(|s| **s == SlotSymbol::HappyCoin)
        .count() as u32;
    let bonus_triggered = bonus_symbols > 0;
    let free_spins_awarded = bonus_symbols * FREE_SPINS_PER_BONUS_SYMBOL;

    Ok(RoundResolution {
        win_amount,
        multiplier: Multiplier::from_bp(multiplier_bp),
        outcome: RoundOutcome::Slots {
            reels,
            payline,
            bonus_triggered,
            free_spins_awarded,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_symbol_weights_sum_to_total() {
        let sum: u32 = SYMBOL_TABLE.iter().map(|(_, w, _)| w).sum();
        assert_eq!(sum, TOTAL_WEIGHT);
    }

    #[test]
    fn test_five_of_a_kind_pays_full_value() {
        let payline = vec![SlotSymbol::Seven; 5];
        assert_eq!(payline_multiplier_bp(&payline), 250_000);
    }

    #[test]
    fn test_first_three_match_pays_half_value() {
        let payline = vec![
            SlotSymbol::Trophy,
            SlotSymbol::Trophy,
            SlotSymbol::Trophy,
            SlotSymbol::Bell,
            SlotSymbol::Cherry,
        ];
        assert_eq!(payline_multiplier_bp(&payline), 25_000);
    }

    #[test]
    fn test_cherry_half_value_truncates() {
        // 1.5x full value, 0.75x for first-3.
        let payline = vec![
            SlotSymbol::Cherry,
            SlotSymbol::Cherry,
            SlotSymbol::Cherry,
            SlotSymbol::Bell,
            SlotSymbol::Bell,
        ];
        assert_eq!(payline_multiplier_bp(&payline), 7_500);
    }

    #[test]
    fn test_mixed_payline_pays_nothing() {
        let payline = vec![
            SlotSymbol::Cherry,
            SlotSymbol::Bell,
            SlotSymbol::Cherry,
            SlotSymbol::Cherry,
            SlotSymbol::Cherry,
        ];
        assert_eq!(payline_multiplier_bp(&payline), 0);
    }

    #[test]
    fn test_spin_is_deterministic_under_a_seed() {
        let bet = Amount::from_minor(100);
        let first = spin(bet, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = spin(bet, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spin_shape_and_bonus_accounting() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = spin(Amount::from_minor(100), &mut rng).unwrap();

        let RoundOutcome::Slots {
            reels,
            payline,
            bonus_triggered,
            free_spins_awarded,
        } = result.outcome
        else {
            panic!("expected a slots outcome");
        };

        assert_eq!(reels.len(), REELS);
        assert!(reels.iter().all(|r| r.len() == ROWS));
        assert_eq!(payline.len(), REELS);

        let coins = payline
            .iter()
            .filter(|s| **s == SlotSymbol::HappyCoin)
            .count() as u32;
        assert_eq!(bonus_triggered, coins > 0);
        assert_eq!(free_spins_awarded, coins * FREE_SPINS_PER_BONUS_SYMBOL);
    }
}
