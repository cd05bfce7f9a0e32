use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::CourseError;

/// JsonInput
///
/// `Json<T>` whose rejection is reported as a validation failure. A type
/// mismatch on a top-level field (e.g. an unknown `level`) is keyed by that
/// field; anything else (bad syntax, missing field, wrong content type) is
/// keyed by `body`.
pub struct JsonInput<T>(pub T);

impl<S, T> FromRequest<S> for JsonInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CourseError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(json_rejection)
    }
}

fn json_rejection(rejection: JsonRejection) -> CourseError {
    let text = rejection.body_text();
    if let JsonRejection::JsonDataError(_) = &rejection {
        if let Some((field, message)) = data_error_field(&text) {
            return CourseError::invalid_field(field, message);
        }
    }
    CourseError::invalid_field("body", text)
}

/// Splits `"<prefix>: <field>: <message>"` into field and message when the path
/// is a plain top-level field name.
fn data_error_field(text: &str) -> Option<(&str, &str)> {
    let (_, detail) = text.split_once(": ")?;
    let (path, message) = detail.split_once(": ")?;
    let plain = !path.is_empty() && path.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    plain.then_some((path, message))
}

/// QueryInput
///
/// `Query<T>` whose rejection is reported as a validation failure on `query`.
pub struct QueryInput<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CourseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| CourseError::invalid_field("query", rejection.body_text()))
    }
}

/// CourseId
///
/// The `{id}` path segment, which must be a well-formed UUID.
pub struct CourseId(pub Uuid);

impl<S> FromRequestParts<S> for CourseId
where
    S: Send + Sync,
{
    type Rejection = CourseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Self(id))
            .map_err(|_| CourseError::invalid_field("id", "Course id must be a valid UUID"))
    }
}
