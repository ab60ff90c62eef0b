use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;

/// Caller identity taken from the `x-user-id` header.
///
/// The account provider is an external collaborator; this service trusts the
/// header it forwards and only enforces that it is present and non-empty.
#[derive(Debug, Clone)]
pub struct CallerId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CallerId(v.to_string()))
            .ok_or(AppError::MissingCaller)
    }
}

/// JSON extractor that runs `validator` rules after deserialization and
/// formats both kinds of failure as standardized JSON error responses
/// instead of plain text.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationJsonRejection::Json)?;

        value
            .validate()
            .map_err(|e| ValidationJsonRejection::Rules(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

/// Rejection covering both malformed JSON and failed validation rules
pub enum ValidationJsonRejection {
    Json(JsonRejection),
    Rules(String),
}

impl IntoResponse for ValidationJsonRejection {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ValidationJsonRejection::Json(rejection) => {
                let error_message = rejection.to_string();
                if error_message.contains("missing field") {
                    let field = error_message
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    (
                        "VALIDATION_MISSING_FIELD",
                        format!("Missing required field: {}", field),
                    )
                } else {
                    (
                        "VALIDATION_INVALID_INPUT",
                        "Invalid request body: failed to parse JSON".to_string(),
                    )
                }
            }
            ValidationJsonRejection::Rules(detail) => (
                "VALIDATION_INVALID_INPUT",
                format!("Request validation failed: {}", detail),
            ),
        };

        tracing::warn!(
            error_code = code,
            error_message = %message,
            "Request validation failed"
        );

        metrics::counter!("errors_total", "category" => "Validation", "code" => code)
            .increment(1);

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "category": "Validation",
            }
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
