/// Shared error taxonomy for the wallet ledger and gaming core
///
/// Design Philosophy:
/// - Every failure surfaces a structured code so callers branch on the kind,
///   never on message text
/// - Categorized by error domain (Validation, NotFound, Unauthorized,
///   Storage, Internal)
/// - Codes follow pattern: <CATEGORY>_<SPECIFIC>
/// - Context field carries debugging detail (amounts, ids)
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories that map to HTTP status codes and logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Caller-correctable input errors (400 Bad Request)
    Validation,

    /// Resource not found (404 Not Found)
    NotFound,

    /// Caller is not allowed to act on the resource (403 Forbidden)
    Unauthorized,

    /// Transient storage failure, retryable (503 Service Unavailable)
    Storage,

    /// Unexpected failures, programming errors (500 Internal Server Error)
    Internal,
}

impl ErrorCategory {
    /// Map error category to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Unauthorized => 403,
            ErrorCategory::Storage => 503,
            ErrorCategory::Internal => 500,
        }
    }

    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "warn",
            ErrorCategory::NotFound => "info",
            ErrorCategory::Unauthorized => "warn",
            ErrorCategory::Storage => "error",
            ErrorCategory::Internal => "error",
        }
    }
}

/// Standard error codes used across the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INSUFFICIENT_FUNDS: ErrorCode =
        ErrorCode("VALIDATION_INSUFFICIENT_FUNDS");
    pub const VALIDATION_INVALID_BET_AMOUNT: ErrorCode =
        ErrorCode("VALIDATION_INVALID_BET_AMOUNT");
    pub const VALIDATION_INVALID_CONVERSION: ErrorCode =
        ErrorCode("VALIDATION_INVALID_CONVERSION");
    pub const VALIDATION_INVALID_AMOUNT: ErrorCode = ErrorCode("VALIDATION_INVALID_AMOUNT");
    pub const VALIDATION_INVALID_INPUT: ErrorCode = ErrorCode("VALIDATION_INVALID_INPUT");
    pub const VALIDATION_MISSING_FIELD: ErrorCode = ErrorCode("VALIDATION_MISSING_FIELD");

    // Resource errors
    pub const NOT_FOUND_WALLET: ErrorCode = ErrorCode("NOT_FOUND_WALLET");
    pub const NOT_FOUND_GAME: ErrorCode = ErrorCode("NOT_FOUND_GAME");
    pub const NOT_FOUND_SESSION: ErrorCode = ErrorCode("NOT_FOUND_SESSION");
    pub const NOT_FOUND_TRANSACTION: ErrorCode = ErrorCode("NOT_FOUND_TRANSACTION");

    // Ownership errors
    pub const UNAUTHORIZED_SESSION_OWNER: ErrorCode = ErrorCode("UNAUTHORIZED_SESSION_OWNER");
    pub const UNAUTHORIZED_MISSING_CALLER: ErrorCode = ErrorCode("UNAUTHORIZED_MISSING_CALLER");

    // Storage errors
    pub const STORAGE_UNAVAILABLE: ErrorCode = ErrorCode("STORAGE_UNAVAILABLE");
    pub const STORAGE_WRITE_FAILED: ErrorCode = ErrorCode("STORAGE_WRITE_FAILED");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");
    pub const INTERNAL_SERIALIZATION: ErrorCode = ErrorCode("INTERNAL_SERIALIZATION");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure surfaced to API callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category (determines status code and log level)
    pub category: ErrorCategory,

    /// Structured error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (e.g. amounts, ids)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Validation error constructors
    pub fn insufficient_funds(required: impl fmt::Display, available: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INSUFFICIENT_FUNDS,
            "Insufficient funds",
        )
        .with_context(format!("required: {}, available: {}", required, available))
    }

    pub fn invalid_bet_amount(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_BET_AMOUNT,
            message,
        )
    }

    pub fn invalid_conversion(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_CONVERSION,
            format!("Unsupported conversion: {} -> {}", from, to),
        )
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_AMOUNT,
            message,
        )
    }

    // Resource not found constructors
    pub fn wallet_not_found(user_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_WALLET,
            format!("Wallet not found for user {}", user_id),
        )
    }

    pub fn game_not_found(game_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_GAME,
            format!("Game not found: {}", game_id),
        )
    }

    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_SESSION,
            format!("Session not found: {}", session_id),
        )
    }

    // Ownership constructors
    pub fn session_not_owned(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Unauthorized,
            ErrorCode::UNAUTHORIZED_SESSION_OWNER,
            format!("Session {} is owned by another user", session_id),
        )
    }

    // Storage constructors
    pub fn storage(error: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Storage,
            ErrorCode::STORAGE_UNAVAILABLE,
            "Storage failure",
        )
        .with_context(error.to_string())
    }

    // Internal constructors
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_UNEXPECTED,
            message,
        )
    }

    pub fn serialization(error: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_SERIALIZATION,
            "Serialization error",
        )
        .with_context(error.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "[{}] {}: {}", self.code, self.message, context)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}
