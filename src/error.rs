use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

use crate::models::entry_status::TransitionError;
use crate::services::analyzer::AnalysisError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Read only: {0}")]
    ReadOnly(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::RateLimited { message } => AppError::RateLimited(message),
            AnalysisError::Unavailable { message } => AppError::AnalysisUnavailable(message),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_messages(&errors))
    }
}

/// Flattens record validation into "field: message" sentences, sorted by field.
pub fn field_messages(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{} {}", humanize(field), msg),
                None => format!("{} is invalid", humanize(field)),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::ReadOnly(msg) => (StatusCode::LOCKED, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::AnalysisUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_field_messages_are_sorted_and_humanized() {
        let mut errors = ValidationErrors::new();
        let mut too_big = ValidationError::new("range");
        too_big.message = Some("must be less than 10000".into());
        errors.add("proteins", too_big);
        errors.add("gram_weight", ValidationError::new("range"));

        assert_eq!(
            field_messages(&errors),
            "Gram weight is invalid, Proteins must be less than 10000"
        );
    }

    #[test]
    fn test_analysis_error_maps_to_status() {
        let err: AppError = AnalysisError::RateLimited {
            message: "slow down".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);

        let err: AppError = AnalysisError::Unavailable {
            message: "later".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
