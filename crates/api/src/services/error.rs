use unieats_auth::AuthError;
use unieats_database::DatabaseError;

use crate::ApiError;

#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    Database(DatabaseError),
    Auth(AuthError),
    Internal(String),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Convert into an HTTP error. Storage and internal failures are logged
    /// and replaced by a generic "Failed to {action}" message.
    pub fn into_api(self, action: &str) -> ApiError {
        let generic =
            || ApiError::internal_server_error(format!("Failed to {action}. Please try again."));
        match self {
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::BadRequest(msg) => ApiError::bad_request(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Database(err) => {
                tracing::error!(error = %err, action, "database error");
                generic()
            }
            ServiceError::Auth(err) => ApiError::from(err),
            ServiceError::Internal(msg) => {
                tracing::error!(error = %msg, action, "internal error");
                generic()
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::BadRequest(msg)
            | ServiceError::Conflict(msg)
            | ServiceError::Internal(msg) => f.write_str(msg),
            ServiceError::Database(err) => write!(f, "{err}"),
            ServiceError::Auth(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        err.into_api("complete the request")
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => Self::NotFound(msg),
            DatabaseError::Duplicate(msg) => Self::Conflict(msg),
            DatabaseError::ValidationError(msg) => Self::BadRequest(msg),
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::from(DatabaseError::from(err))
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn database_errors_are_classified() {
        let missing = ServiceError::from(DatabaseError::not_found("order"));
        assert!(matches!(missing, ServiceError::NotFound(_)));

        let duplicate = ServiceError::from(DatabaseError::Duplicate("email".into()));
        assert_eq!(duplicate.into_api("save").status, StatusCode::CONFLICT);

        let invalid = ServiceError::from(DatabaseError::validation("bad quantity"));
        assert_eq!(invalid.into_api("save").status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_use_generic_message() {
        let err = ServiceError::from(DatabaseError::QueryError("disk I/O error".into()));
        let api = err.into_api("load orders");
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Failed to load orders. Please try again.");
    }
}
