//! String mappings between domain enums and Redis hash field values.
//!
//! The wire format here is storage-internal and stable; it intentionally
//! matches the serde snake_case names so dumps read the same as API JSON.

use shared::Currency;

use crate::domain::{PaymentMethod, SessionStatus, TransactionKind, TransactionStatus};

pub fn kind_to_string(kind: &TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Deposit => "deposit",
        TransactionKind::Withdrawal => "withdrawal",
        TransactionKind::BetPlaced => "bet_placed",
        TransactionKind::BetWon => "bet_won",
        TransactionKind::WelcomeBonus => "welcome_bonus",
        TransactionKind::ConversionInrToHc => "conversion_inr_to_hc",
        TransactionKind::ConversionHcToInr => "conversion_hc_to_inr",
    }
}

pub fn kind_from_string(s: &str) -> Option<TransactionKind> {
    match s {
        "deposit" => Some(TransactionKind::Deposit),
        "withdrawal" => Some(TransactionKind::Withdrawal),
        "bet_placed" => Some(TransactionKind::BetPlaced),
        "bet_won" => Some(TransactionKind::BetWon),
        "welcome_bonus" => Some(TransactionKind::WelcomeBonus),
        "conversion_inr_to_hc" => Some(TransactionKind::ConversionInrToHc),
        "conversion_hc_to_inr" => Some(TransactionKind::ConversionHcToInr),
        _ => None,
    }
}

pub fn tx_status_to_string(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Completed => "completed",
        TransactionStatus::Failed => "failed",
    }
}

pub fn tx_status_from_string(s: &str) -> Option<TransactionStatus> {
    match s {
        "pending" => Some(TransactionStatus::Pending),
        "completed" => Some(TransactionStatus::Completed),
        "failed" => Some(TransactionStatus::Failed),
        _ => None,
    }
}

pub fn payment_method_to_string(method: &PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Upi => "upi",
        PaymentMethod::Card => "card",
        PaymentMethod::BankTransfer => "bank_transfer",
        PaymentMethod::Crypto => "crypto",
    }
}

pub fn payment_method_from_string(s: &str) -> Option<PaymentMethod> {
    match s {
        "upi" => Some(PaymentMethod::Upi),
        "card" => Some(PaymentMethod::Card),
        "bank_transfer" => Some(PaymentMethod::BankTransfer),
        "crypto" => Some(PaymentMethod::Crypto),
        _ => None,
    }
}

pub fn session_status_to_string(status: &SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Completed => "completed",
        SessionStatus::Cancelled => "cancelled",
    }
}

pub fn session_status_from_string(s: &str) -> Option<SessionStatus> {
    match s {
        "active" => Some(SessionStatus::Active),
        "completed" => Some(SessionStatus::Completed),
        "cancelled" => Some(SessionStatus::Cancelled),
        _ => None,
    }
}

pub fn currency_to_string(currency: &Currency) -> &'static str {
    currency.as_str()
}

pub fn currency_from_string(s: &str) -> Option<Currency> {
    Currency::parse(s).ok()
}

/// Redis hash field that accumulates the lifetime counter for a transaction
/// kind; None for kinds that do not feed a counter.
pub fn lifetime_counter_field(kind: &TransactionKind) -> Option<&'static str> {
    match kind {
        TransactionKind::Deposit => Some("total_deposited"),
        TransactionKind::Withdrawal => Some("total_withdrawn"),
        TransactionKind::BetPlaced => Some("total_bet_amount"),
        TransactionKind::BetWon => Some("total_winnings"),
        TransactionKind::WelcomeBonus
        | TransactionKind::ConversionInrToHc
        | TransactionKind::ConversionHcToInr => None,
    }
}

/// Redis hash field holding the balance for a currency.
pub fn balance_field(currency: &Currency) -> &'static str {
    match currency {
        Currency::Inr => "inr_balance",
        Currency::Hc => "hc_balance",
    }
}
