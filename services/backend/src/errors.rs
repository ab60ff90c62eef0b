use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::{Amount, AmountError, Currency, ErrorCategory, ErrorCode, ServiceError};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("Wallet not found for user {0}")]
    WalletNotFound(String),

    #[error("Invalid bet amount: {0}")]
    InvalidBetAmount(String),

    #[error("Unsupported conversion: {from} -> {to}")]
    InvalidConversion { from: Currency, to: Currency },

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session {0} is owned by another user")]
    SessionNotOwnedByCaller(Uuid),

    #[error("Missing x-user-id header")]
    MissingCaller,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Map to the shared taxonomy surfaced in every error body.
    pub fn to_service_error(&self) -> ServiceError {
        match self {
            AppError::InsufficientFunds {
                required,
                available,
            } => ServiceError::insufficient_funds(required, available),
            AppError::WalletNotFound(user_id) => ServiceError::wallet_not_found(user_id),
            AppError::InvalidBetAmount(msg) => ServiceError::invalid_bet_amount(msg.clone()),
            AppError::InvalidConversion { from, to } => ServiceError::invalid_conversion(from, to),
            AppError::GameNotFound(game_id) => ServiceError::game_not_found(game_id),
            AppError::SessionNotFound(session_id) => ServiceError::session_not_found(session_id),
            AppError::SessionNotOwnedByCaller(session_id) => {
                ServiceError::session_not_owned(session_id)
            }
            AppError::MissingCaller => ServiceError::new(
                ErrorCategory::Unauthorized,
                ErrorCode::UNAUTHORIZED_MISSING_CALLER,
                "Missing x-user-id header",
            ),
            AppError::Validation(msg) => ServiceError::new(
                ErrorCategory::Validation,
                ErrorCode::VALIDATION_INVALID_INPUT,
                msg.clone(),
            ),
            AppError::Redis(e) => ServiceError::storage(e),
            AppError::Storage(msg) => ServiceError::storage(msg),
            AppError::Internal(e) => ServiceError::internal(e.to_string()),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCaller => StatusCode::UNAUTHORIZED,
            AppError::SessionNotOwnedByCaller(_) => StatusCode::FORBIDDEN,
            other => StatusCode::from_u16(other.to_service_error().category.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<AmountError> for AppError {
    fn from(e: AmountError) -> Self {
        match e {
            AmountError::Overflow => {
                AppError::Internal(anyhow::anyhow!("Amount arithmetic overflow"))
            }
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let service_error = self.to_service_error();
        let category = format!("{:?}", service_error.category);

        match service_error.category.log_level() {
            "error" => tracing::error!(
                error_code = %service_error.code,
                error_message = %service_error.message,
                "Request failed"
            ),
            "warn" => tracing::warn!(
                error_code = %service_error.code,
                error_message = %service_error.message,
                "Request rejected"
            ),
            _ => tracing::info!(
                error_code = %service_error.code,
                error_message = %service_error.message,
                "Request rejected"
            ),
        }

        metrics::counter!(
            "errors_total",
            "category" => category.clone(),
            "code" => service_error.code.clone()
        )
        .increment(1);

        let body = Json(json!({
            "error": {
                "code": service_error.code,
                "message": service_error.message,
                "category": category,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
