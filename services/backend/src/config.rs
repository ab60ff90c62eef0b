use serde::Deserialize;
use shared::constants;
use shared::Amount;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    pub redis: RedisConfig,
    pub wallet: WalletConfig,
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Whole INR per whole HC; both currencies share minor-unit precision so
    /// the same ratio applies at minor-unit level.
    pub hc_to_inr_rate: i64,
    /// Minimum deposit in minor INR units.
    pub min_deposit: Amount,
    /// Minimum withdrawal in minor INR units.
    pub min_withdrawal: Amount,
    /// One-time bonus in minor HC units granted after the first completed
    /// deposit.
    pub welcome_bonus: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    pub sweep_interval_secs: u64,
    /// Age after which a still-pending transaction is treated as orphaned.
    pub pending_max_age_secs: i64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            wallet: WalletConfig {
                hc_to_inr_rate: env::var("HC_TO_INR_RATE")
                    .unwrap_or_else(|_| constants::DEFAULT_HC_TO_INR_RATE.to_string())
                    .parse()?,
                min_deposit: Amount::from_minor(
                    env::var("MIN_DEPOSIT_INR_MINOR")
                        .unwrap_or_else(|_| constants::MIN_DEPOSIT_INR_MINOR.to_string())
                        .parse()?,
                ),
                min_withdrawal: Amount::from_minor(
                    env::var("MIN_WITHDRAWAL_INR_MINOR")
                        .unwrap_or_else(|_| constants::MIN_WITHDRAWAL_INR_MINOR.to_string())
                        .parse()?,
                ),
                welcome_bonus: Amount::from_minor(
                    env::var("WELCOME_BONUS_HC_MINOR")
                        .unwrap_or_else(|_| constants::WELCOME_BONUS_HC_MINOR.to_string())
                        .parse()?,
                ),
            },
            reconciliation: ReconciliationConfig {
                sweep_interval_secs: env::var("RECONCILIATION_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
                pending_max_age_secs: env::var("PENDING_TRANSACTION_MAX_AGE_SECS")
                    .unwrap_or_else(|_| {
                        constants::PENDING_TRANSACTION_MAX_AGE_SECS.to_string()
                    })
                    .parse()?,
            },
        })
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            hc_to_inr_rate: constants::DEFAULT_HC_TO_INR_RATE,
            min_deposit: Amount::from_minor(constants::MIN_DEPOSIT_INR_MINOR),
            min_withdrawal: Amount::from_minor(constants::MIN_WITHDRAWAL_INR_MINOR),
            welcome_bonus: Amount::from_minor(constants::WELCOME_BONUS_HC_MINOR),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: 3001,
            metrics_port: 9090,
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            wallet: WalletConfig::default(),
            reconciliation: ReconciliationConfig {
                sweep_interval_secs: 60,
                pending_max_age_secs: constants::PENDING_TRANSACTION_MAX_AGE_SECS,
            },
        }
    }
}
