//! Application error type and its HTTP mapping.
//!
//! Every handler and service returns `Result<T, AppError>`. The error carries
//! the HTTP status to answer with, the underlying [`anyhow::Error`] and, for
//! validation failures, a per-field map of messages.
//!
//! Server errors (5xx other than 503) never leak their cause to the client:
//! the full error chain is logged and a generic message is returned instead.

use std::collections::BTreeMap;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Message returned for every unexpected server error.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error. Please try again later.";

/// Field name to list of human readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    pub details: Option<FieldErrors>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            details: None,
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            anyhow::anyhow!(message.into()),
        )
    }

    /// 400 response carrying a single field error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.clone()]);
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message),
            details: Some(details),
        }
    }

    /// 400 response built from `validator` output.
    pub fn validation(errors: &ValidationErrors) -> Self {
        let mut details = FieldErrors::new();
        collect_field_errors("", errors, &mut details);
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!("Validation failed"),
            details: Some(details),
        }
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(path.clone()).or_default();
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| match error.code.as_ref() {
                            "required" => format!("{} is required", field),
                            "email" => "Enter a valid email address".to_string(),
                            _ => format!("{} is invalid", field),
                        });
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(status = %self.status.as_u16(), error = ?self.error, "Unhandled error");
            let body = Json(json!({ "error": INTERNAL_ERROR_MESSAGE }));
            return (self.status, body).into_response();
        }

        let body = match self.details {
            Some(details) => Json(json!({
                "error": self.error.to_string(),
                "details": details,
            })),
            None => Json(json!({ "error": self.error.to_string() })),
        };

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct Inner {
        #[validate(length(min = 1, message = "Status is required"))]
        status: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Outer {
        #[validate(email)]
        email: String,
        #[validate(nested)]
        records: Vec<Inner>,
    }

    #[test]
    fn test_constructors_set_status() {
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("x")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::forbidden("no").status, StatusCode::FORBIDDEN);
        assert_eq!(AppError::unauthorized("no").status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("x")).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_validation_collects_nested_fields() {
        let value = Outer {
            email: "not-an-email".into(),
            records: vec![
                Inner {
                    status: "present".into(),
                },
                Inner { status: "".into() },
            ],
        };
        let errors = value.validate().unwrap_err();
        let err = AppError::validation(&errors);

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        assert_eq!(details["email"], vec!["Enter a valid email address"]);
        assert_eq!(details["records[1].status"], vec!["Status is required"]);
        assert!(!details.contains_key("records[0].status"));
    }

    #[test]
    fn test_field_error_has_details() {
        let err = AppError::field("confirm_password", "Passwords do not match");
        assert_eq!(err.message(), "Passwords do not match");
        assert_eq!(
            err.details.unwrap()["confirm_password"],
            vec!["Passwords do not match"]
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        use axum::body::to_bytes;

        let response =
            AppError::database(anyhow::anyhow!("relation \"users\" does not exist")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_validation_response_shape() {
        use axum::body::to_bytes;

        let response = AppError::field("phone_number", "Invalid phone number").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid phone number");
        assert_eq!(body["details"]["phone_number"][0], "Invalid phone number");
    }
}
