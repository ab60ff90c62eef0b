//! Session manager: the only writer of sessions and round results.
//!
//! A round is strictly ordered: validate parameters, debit the stake
//! through the ledger, compute the outcome, credit any winnings, accumulate
//! session stats, persist the write-once result. Parameter validation
//! happens before the debit so a malformed round never moves money.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Amount, Multiplier};
use uuid::Uuid;

use crate::domain::{
    DiceDirection, Game, GameResult, GameSession, GameStatus, GameType, RoundParams,
    RoundResponse, SessionStatus,
};
use crate::errors::{AppError, Result};
use crate::games::{self, RoundResolution};
use crate::repository::{GameCatalog, SessionRepository};

use super::WalletService;

/// Round parameters after validation, with caller floats already converted
/// to exact fixed-point types.
enum ValidatedParams {
    Slots,
    Crash { target: Option<Multiplier> },
    Dice { target: u8, direction: DiceDirection },
}

pub struct GamingService {
    wallet: Arc<WalletService>,
    sessions: Arc<dyn SessionRepository>,
    catalog: Arc<dyn GameCatalog>,
}

impl GamingService {
    pub fn new(
        wallet: Arc<WalletService>,
        sessions: Arc<dyn SessionRepository>,
        catalog: Arc<dyn GameCatalog>,
    ) -> Self {
        Self {
            wallet,
            sessions,
            catalog,
        }
    }

    pub async fn list_games(&self) -> Result<Vec<Game>> {
        self.catalog.list().await
    }

    pub async fn start_session(
        &self,
        user_id: &str,
        game_id: &str,
        bet_amount: Amount,
    ) -> Result<GameSession> {
        let game = self.active_game(game_id).await?;
        check_bet_bounds(&game, bet_amount)?;

        let wallet = self.wallet.get_or_create_wallet(user_id).await?;
        if wallet.hc_balance < bet_amount {
            return Err(AppError::InsufficientFunds {
                required: bet_amount,
                available: wallet.hc_balance,
            });
        }

        let session = GameSession::new(user_id, game_id);
        self.sessions.insert_session(&session).await?;

        tracing::info!(
            session_id = %session.session_id,
            user_id = %user_id,
            game_id = %game_id,
            "Session started"
        );
        metrics::counter!("sessions_started_total", "game" => game_id.to_string())
            .increment(1);
        Ok(session)
    }

    pub async fn play_round(
        &self,
        user_id: &str,
        session_id: Uuid,
        bet_amount: Amount,
        params: RoundParams,
    ) -> Result<RoundResponse> {
        let session = self.owned_session(user_id, session_id).await?;
        // Rounds on an ended session are indistinguishable from rounds on a
        // session that never existed.
        if session.status != SessionStatus::Active {
            return Err(AppError::SessionNotFound(session_id));
        }

        let game = self.active_game(&session.game_id).await?;
        check_bet_bounds(&game, bet_amount)?;
        let validated = validate_params(&game, params)?;

        let debit = self
            .wallet
            .place_bet(
                user_id,
                bet_amount,
                format!("Bet on {}", game.name),
            )
            .await?;

        let resolution = {
            let mut rng = StdRng::from_entropy();
            run_engine(bet_amount, &validated, &mut rng)?
        };

        let mut hc_balance = debit.balance_after.unwrap_or(debit.balance_before);
        if resolution.win_amount.is_positive() {
            let credit = self
                .wallet
                .credit_win(
                    user_id,
                    resolution.win_amount,
                    format!("Win on {}", game.name),
                )
                .await?;
            hc_balance = credit.balance_after.unwrap_or(hc_balance);
        }

        let session = self
            .sessions
            .record_round(session_id, bet_amount, resolution.win_amount)
            .await?;

        let result = GameResult {
            result_id: Uuid::new_v4(),
            session_id,
            user_id: user_id.to_string(),
            game_id: session.game_id.clone(),
            bet_amount,
            win_amount: resolution.win_amount,
            multiplier: resolution.multiplier,
            outcome: resolution.outcome,
            is_winning: resolution.win_amount.is_positive(),
            created_at: Utc::now(),
        };
        self.sessions.insert_result(&result).await?;

        tracing::info!(
            session_id = %session_id,
            result_id = %result.result_id,
            bet = %bet_amount,
            win = %result.win_amount,
            "Round resolved"
        );
        metrics::counter!("rounds_played_total", "game" => session.game_id.clone())
            .increment(1);
        if result.is_winning {
            metrics::counter!("rounds_won_total", "game" => session.game_id.clone())
                .increment(1);
        }

        Ok(RoundResponse {
            result,
            session,
            hc_balance,
        })
    }

    pub async fn end_session(&self, user_id: &str, session_id: Uuid) -> Result<GameSession> {
        self.owned_session(user_id, session_id).await?;
        let session = self.sessions.close_session(session_id, Utc::now()).await?;

        tracing::info!(
            session_id = %session_id,
            total_spins = session.total_spins,
            total_bet = %session.total_bet,
            total_winnings = %session.total_winnings,
            "Session ended"
        );
        Ok(session)
    }

    pub async fn get_session(&self, user_id: &str, session_id: Uuid) -> Result<GameSession> {
        self.owned_session(user_id, session_id).await
    }

    /// The session's round results in play order, owner only.
    pub async fn get_session_results(
        &self,
        user_id: &str,
        session_id: Uuid,
    ) -> Result<Vec<GameResult>> {
        self.owned_session(user_id, session_id).await?;
        self.sessions.list_results(session_id).await
    }

    async fn owned_session(&self, user_id: &str, session_id: Uuid) -> Result<GameSession> {
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or(AppError::SessionNotFound(session_id))?;
        if session.user_id != user_id {
            return Err(AppError::SessionNotOwnedByCaller(session_id));
        }
        Ok(session)
    }

    async fn active_game(&self, game_id: &str) -> Result<Game> {
        let game = self
            .catalog
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::GameNotFound(game_id.to_string()))?;
        if game.status != GameStatus::Active {
            return Err(AppError::GameNotFound(game_id.to_string()));
        }
        Ok(game)
    }
}

fn check_bet_bounds(game: &Game, bet: Amount) -> Result<()> {
    if bet < game.min_bet || bet > game.max_bet {
        return Err(AppError::InvalidBetAmount(format!(
            "Bet must be between {} and {} HC for {}",
            game.min_bet, game.max_bet, game.name
        )));
    }
    Ok(())
}

/// Cross-check params against the game family and convert floats to exact
/// types. Runs before any money moves.
fn validate_params(game: &Game, params: RoundParams) -> Result<ValidatedParams> {
    match (game.game_type, params) {
        (GameType::SlotMachine, RoundParams::Slots) => Ok(ValidatedParams::Slots),
        (GameType::CrashGame, RoundParams::Crash { target_multiplier }) => {
            let target = match target_multiplier {
                Some(value) => Some(Multiplier::from_f64_2dp(value).ok_or_else(|| {
                    AppError::Validation(format!("Invalid target multiplier: {}", value))
                })?),
                None => None,
            };
            // Reject sub-minimum targets up front via a dry resolve.
            games::crash::resolve(Amount::ZERO, target, Multiplier::ONE)?;
            Ok(ValidatedParams::Crash { target })
        }
        (GameType::Dice, RoundParams::Dice { target, direction }) => {
            games::dice::payout_multiplier_bp(target, direction)?;
            Ok(ValidatedParams::Dice { target, direction })
        }
        _ => Err(AppError::Validation(
            "Round parameters do not match the session's game".to_string(),
        )),
    }
}

fn run_engine(
    bet: Amount,
    params: &ValidatedParams,
    rng: &mut StdRng,
) -> Result<RoundResolution> {
    let resolution = match params {
        ValidatedParams::Slots => games::slots::spin(bet, rng)?,
        ValidatedParams::Crash { target } => games::crash::play(bet, *target, rng)?,
        ValidatedParams::Dice { target, direction } => {
            games::dice::roll(bet, *target, *direction, rng)?
        }
    };
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletConfig;
    use crate::domain::{DepositRequest, PaymentMethod, TransactionKind};
    use crate::repository::{
        seed_default_games, MemoryGameCatalog, MemoryLedgerRepository, MemorySessionRepository,
    };
    use shared::Currency;

    async fn setup() -> (GamingService, Arc<WalletService>) {
        let ledger = Arc::new(MemoryLedgerRepository::new());
        let wallet = Arc::new(WalletService::new(ledger, WalletConfig::default()));
        let catalog = Arc::new(MemoryGameCatalog::new());
        seed_default_games(catalog.as_ref()).await.unwrap();
        let gaming = GamingService::new(
            Arc::clone(&wallet),
            Arc::new(MemorySessionRepository::new()),
            catalog,
        );
        (gaming, wallet)
    }

    /// Deposit and convert so the user holds `hc_minor` HC (plus bonus).
    async fn fund_hc(wallet: &WalletService, user_id: &str, hc_minor: i64) {
        wallet
            .process_deposit(
                user_id,
                DepositRequest {
                    amount: Amount::from_minor(hc_minor * 1_000),
                    payment_method: PaymentMethod::Upi,
                    external_id: None,
                },
            )
            .await
            .unwrap();
        wallet
            .convert_currency(
                user_id,
                Amount::from_minor(hc_minor * 1_000),
                Currency::Inr,
                Currency::Hc,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_session_requires_known_active_game() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let result = gaming
            .start_session("user-1", "roulette", Amount::from_minor(100))
            .await;
        assert!(matches!(result, Err(AppError::GameNotFound(_))));
    }

    #[tokio::test]
    async fn test_start_session_enforces_bet_bounds() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let result = gaming
            .start_session("user-1", "dice", Amount::from_minor(5))
            .await;
        assert!(matches!(result, Err(AppError::InvalidBetAmount(_))));
    }

    #[tokio::test]
    async fn test_start_session_requires_covering_balance() {
        let (gaming, wallet) = setup().await;
        // Welcome bonus only: 1.00 HC.
        wallet
            .process_deposit(
                "user-1",
                DepositRequest {
                    amount: Amount::from_minor(10_000),
                    payment_method: PaymentMethod::Upi,
                    external_id: None,
                },
            )
            .await
            .unwrap();

        let result = gaming
            .start_session("user-1", "dice", Amount::from_minor(200))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));
    }

    #[tokio::test]
    async fn test_round_accumulates_stats_and_moves_money() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(100))
            .await
            .unwrap();

        let response = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 7,
                    direction: DiceDirection::Over,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.session.total_spins, 1);
        assert_eq!(response.session.total_bet, Amount::from_minor(100));
        assert_eq!(
            response.session.total_winnings,
            response.result.win_amount
        );
        if response.result.is_winning {
            // Over 7 pays exactly 8.55x.
            assert_eq!(response.result.win_amount, Amount::from_minor(855));
        }

        let refreshed = wallet.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(refreshed.hc_balance, response.hc_balance);
        assert_eq!(refreshed.total_bet_amount, Amount::from_minor(100));

        // The stake debit is in the ledger.
        let history = wallet.get_transactions("user-1", 0, 50).await.unwrap();
        assert!(history
            .iter()
            .any(|t| t.kind == TransactionKind::BetPlaced
                && t.amount == Amount::from_minor(-100)));
    }

    #[tokio::test]
    async fn test_round_with_short_balance_leaves_no_trace() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 100).await;
        // Balance: 1.00 HC converted + 1.00 HC bonus = 2.00 HC.

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(200))
            .await
            .unwrap();

        // Drain the balance below the stake, then try to play.
        wallet
            .place_bet("user-1", Amount::from_minor(150), "Bet on Dice".to_string())
            .await
            .unwrap();

        let result = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 7,
                    direction: DiceDirection::Over,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

        let refreshed = gaming
            .get_session("user-1", session.session_id)
            .await
            .unwrap();
        assert_eq!(refreshed.total_spins, 0);
    }

    #[tokio::test]
    async fn test_round_ownership_is_enforced() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;
        fund_hc(&wallet, "user-2", 1_000).await;

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(100))
            .await
            .unwrap();

        let result = gaming
            .play_round(
                "user-2",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 7,
                    direction: DiceDirection::Over,
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::SessionNotOwnedByCaller(_))
        ));
    }

    #[tokio::test]
    async fn test_round_on_ended_session_reads_as_not_found() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(100))
            .await
            .unwrap();
        let ended = gaming
            .end_session("user-1", session.session_id)
            .await
            .unwrap();
        assert_eq!(ended.status, SessionStatus::Completed);
        assert!(ended.ended_at.is_some());

        let result = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 7,
                    direction: DiceDirection::Over,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_mismatched_params_are_rejected_before_any_debit() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "cricket-slots", Amount::from_minor(100))
            .await
            .unwrap();

        let before = wallet.get_or_create_wallet("user-1").await.unwrap();
        let result = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 7,
                    direction: DiceDirection::Over,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let after = wallet.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(before.hc_balance, after.hc_balance);
    }

    #[tokio::test]
    async fn test_impossible_dice_target_is_rejected_before_any_debit() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(100))
            .await
            .unwrap();

        let before = wallet.get_or_create_wallet("user-1").await.unwrap();
        let result = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Dice {
                    target: 11,
                    direction: DiceDirection::Over,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidBetAmount(_))));

        let after = wallet.get_or_create_wallet("user-1").await.unwrap();
        assert_eq!(before.hc_balance, after.hc_balance);
    }

    #[tokio::test]
    async fn test_session_results_replay_the_rounds_in_order() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "dice", Amount::from_minor(100))
            .await
            .unwrap();

        let mut played = Vec::new();
        for _ in 0..3 {
            let response = gaming
                .play_round(
                    "user-1",
                    session.session_id,
                    Amount::from_minor(100),
                    RoundParams::Dice {
                        target: 7,
                        direction: DiceDirection::Over,
                    },
                )
                .await
                .unwrap();
            played.push(response.result.result_id);
        }

        let results = gaming
            .get_session_results("user-1", session.session_id)
            .await
            .unwrap();
        assert_eq!(
            results.iter().map(|r| r.result_id).collect::<Vec<_>>(),
            played
        );

        // Results are private to the session owner.
        fund_hc(&wallet, "user-2", 1_000).await;
        let result = gaming
            .get_session_results("user-2", session.session_id)
            .await;
        assert!(matches!(
            result,
            Err(AppError::SessionNotOwnedByCaller(_))
        ));
    }

    #[tokio::test]
    async fn test_slots_round_resolves_and_records_result() {
        let (gaming, wallet) = setup().await;
        fund_hc(&wallet, "user-1", 1_000).await;

        let session = gaming
            .start_session("user-1", "cricket-slots", Amount::from_minor(100))
            .await
            .unwrap();

        let response = gaming
            .play_round(
                "user-1",
                session.session_id,
                Amount::from_minor(100),
                RoundParams::Slots,
            )
            .await
            .unwrap();

        assert!(matches!(
            response.result.outcome,
            crate::domain::RoundOutcome::Slots { .. }
        ));
        assert_eq!(response.result.bet_amount, Amount::from_minor(100));
    }
}
