use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Numeric codes carried in the `code` field of every response envelope.
///
/// `0` is success; everything else is a domain failure the dashboard renders
/// as an error notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainCode(pub i32);

impl DomainCode {
    pub const SUCCESS: DomainCode = DomainCode(0);
    /// Upload request without a file part.
    pub const MISSING_FILE: DomainCode = DomainCode(1001);
    /// Data-management type outside the known set.
    pub const UNKNOWN_DATA_TYPE: DomainCode = DomainCode(1002);
    /// Upload whose extension is not a spreadsheet.
    pub const UNSUPPORTED_FILE_TYPE: DomainCode = DomainCode(1003);
    /// Upload larger than the configured limit.
    pub const FILE_TOO_LARGE: DomainCode = DomainCode(1004);
    /// Enterprise dashboard request without `enterpriseId`.
    pub const MISSING_ENTERPRISE_ID: DomainCode = DomainCode(1001);
    /// Enterprise dashboard request for an enterprise with no data.
    pub const UNKNOWN_ENTERPRISE: DomainCode = DomainCode(1002);
    /// Enterprise dashboard time range with no data.
    pub const INVALID_TIME_RANGE: DomainCode = DomainCode(1003);
    /// Request body could not be parsed.
    pub const MALFORMED_REQUEST: DomainCode = DomainCode(4000);
    /// A required identifier (entity id, message text) is missing.
    pub const MISSING_IDENTIFIER: DomainCode = DomainCode(4001);
    /// Time range outside `month | quarter | year | all`.
    pub const UNSUPPORTED_TIME_RANGE: DomainCode = DomainCode(4002);
    /// No synthetic handler matches the path.
    pub const UNKNOWN_ROUTE: DomainCode = DomainCode(4004);
    pub const INTERNAL: DomainCode = DomainCode(5000);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Request rejected before any derivation ran.
    Validation { code: DomainCode, message: String },
    /// Real-path network or server failure.
    Transport(String),
    /// A mock provider failed while computing its payload.
    Provider(String),
    /// A chat turn is already in flight.
    Busy,
    /// Internal error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    pub fn validation(code: DomainCode, message: impl Into<String>) -> Self {
        AppError::Validation {
            code,
            message: message.into(),
        }
    }

    /// The envelope code this error maps to.
    pub fn code(&self) -> DomainCode {
        match self {
            AppError::Validation { code, .. } => *code,
            AppError::WithContext { source, .. } => source.code(),
            _ => DomainCode::INTERNAL,
        }
    }

    /// Strips context wrappers and returns the innermost error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { code, message } => {
                write!(f, "Validation error ({}): {}", code.0, message)
            }
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Provider(msg) => write!(f, "Mock provider error: {}", msg),
            AppError::Busy => write!(f, "A request is already in flight"),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// The body keeps the envelope shape (`code`, `data`, `message`) so the
    /// dashboard can treat gateway failures the same way as upstream ones.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Transport(msg) => {
                tracing::error!("Transport error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
            AppError::Provider(msg) => {
                tracing::error!("Mock provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Mock provider error".to_string())
            }
            AppError::Busy => (StatusCode::CONFLICT, self.to_string()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.clone().into_response();
            }
        };

        let body = Json(json!({
            "code": self.code().0,
            "data": null,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Validation { code, message } => AppError::Validation {
                code: *code,
                message: message.clone(),
            },
            AppError::Transport(msg) => AppError::Transport(msg.clone()),
            AppError::Provider(msg) => AppError::Provider(msg.clone()),
            AppError::Busy => AppError::Busy,
            AppError::Internal(msg) => AppError::Internal(msg.clone()),
            AppError::WithContext { source, context } => AppError::WithContext {
                source: source.clone(),
                context: context.clone(),
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_preserves_code() {
        let err: Result<(), AppError> = Err(AppError::validation(
            DomainCode::UNSUPPORTED_TIME_RANGE,
            "bad range",
        ));
        let wrapped = err.context("loading credit score").unwrap_err();

        assert_eq!(wrapped.code(), DomainCode::UNSUPPORTED_TIME_RANGE);
        assert!(matches!(wrapped.root(), AppError::Validation { .. }));
        assert!(wrapped.to_string().starts_with("loading credit score: "));
    }

    #[test]
    fn test_non_validation_errors_map_to_internal_code() {
        assert_eq!(AppError::Busy.code(), DomainCode::INTERNAL);
        assert_eq!(
            AppError::Transport("down".into()).code(),
            DomainCode::INTERNAL
        );
        assert!(!AppError::Provider("boom".into()).code().is_success());
    }

    #[test]
    fn test_status_mapping() {
        let resp = AppError::validation(DomainCode::MISSING_IDENTIFIER, "x").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Busy.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::Transport("down".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
