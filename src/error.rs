use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Field name → human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

/// RepositoryError
///
/// Failure reported by the persistence layer. Never retried here.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("persistence service unavailable: {0}")]
    Unavailable(String),
}

/// CourseError
///
/// The complete error taxonomy surfaced by course operations.
#[derive(Debug, Error)]
pub enum CourseError {
    /// No caller identity could be resolved for the request.
    #[error("authentication required")]
    Unauthenticated,
    /// Input failed a field constraint. Never reaches the repository.
    #[error("validation failed")]
    Validation(FieldErrors),
    /// No row with that id under the caller's ownership.
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl CourseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CourseError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CourseError::Validation(_) => StatusCode::BAD_REQUEST,
            CourseError::NotFound(_) => StatusCode::NOT_FOUND,
            CourseError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            CourseError::Unauthenticated => "UNAUTHENTICATED",
            CourseError::Validation(_) => "VALIDATION_FAILED",
            CourseError::NotFound(_) => "NOT_FOUND",
            CourseError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Builds a validation failure carrying a single field message.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        CourseError::Validation(BTreeMap::from([(field.to_string(), message.into())]))
    }

    fn body(&self) -> ErrorBody {
        let (message, field_errors) = match self {
            CourseError::Validation(fields) => {
                ("Invalid input".to_string(), Some(fields.clone()))
            }
            // Details stay in the logs.
            CourseError::Persistence(_) => ("Persistence service error".to_string(), None),
            other => (other.to_string(), None),
        };
        ErrorBody {
            error: self.error_code().to_string(),
            message,
            field_errors,
        }
    }
}

impl From<ValidationErrors> for CourseError {
    fn from(errors: ValidationErrors) -> Self {
        CourseError::Validation(field_messages(&errors))
    }
}

impl IntoResponse for CourseError {
    fn into_response(self) -> Response {
        if let CourseError::Persistence(source) = &self {
            tracing::error!(error = %source, "persistence failure");
        }
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// ErrorBody
///
/// JSON shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

/// Flattens validator output into one message per field.
pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, kind) in errors.errors() {
        if let ValidationErrorsKind::Field(list) = kind {
            if let Some(first) = list.first() {
                fields.insert(field.to_string(), describe(field, first));
            }
        }
    }
    fields
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let label = field_label(field);
    if error.code == "length" {
        let min = error.params.get("min").and_then(|v| v.as_u64());
        let max = error.params.get("max").and_then(|v| v.as_u64());
        let len = error
            .params
            .get("value")
            .and_then(|v| v.as_str())
            .map(|s| s.chars().count() as u64);
        return match (len, min, max) {
            (Some(0), _, _) => format!("{label} is required"),
            (Some(len), Some(min), _) if len < min => {
                format!("{label} must be at least {min} characters")
            }
            (_, _, Some(max)) => format!("{label} must be at most {max} characters"),
            _ => format!("{label} has an invalid length"),
        };
    }
    format!("{label} is invalid")
}

fn field_label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5))]
        short_name: String,
    }

    #[test]
    fn empty_field_reads_as_required() {
        let errors = Sample {
            short_name: String::new(),
        }
        .validate()
        .unwrap_err();
        let fields = field_messages(&errors);
        assert_eq!(fields["short_name"], "Short name is required");
    }

    #[test]
    fn overlong_field_names_the_bound() {
        let errors = Sample {
            short_name: "abcdef".to_string(),
        }
        .validate()
        .unwrap_err();
        let fields = field_messages(&errors);
        assert_eq!(fields["short_name"], "Short name must be at most 5 characters");
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(CourseError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            CourseError::invalid_field("id", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CourseError::NotFound("gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CourseError::from(RepositoryError::Unavailable("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn persistence_details_are_not_exposed() {
        let body = CourseError::from(RepositoryError::Unavailable("secret dsn".into())).body();
        assert_eq!(body.error, "PERSISTENCE_FAILURE");
        assert!(!body.message.contains("secret"));
    }
}
