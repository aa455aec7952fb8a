use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use nursery_core::AppError;

/// Turns a body rejection into a 400 naming the offending field when serde
/// reports one.
fn rejection_to_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let error_msg = rejection.body_text();

    if let Some(field) = error_msg
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::field(field, format!("{} is required", field));
    }

    if error_msg.contains("unknown variant") || error_msg.contains("invalid type") {
        let detail = error_msg
            .split(": ")
            .last()
            .unwrap_or("Invalid field value")
            .to_string();
        return AppError::bad_request(anyhow!(detail));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// `Json<T>` that also runs `validator` rules, answering 400 with
/// per-field details on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value
            .validate()
            .map_err(|errors| AppError::validation(&errors))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, message = "Too short."))]
        name: String,
    }

    async fn extract(body: &str, json: bool) -> Result<ValidatedJson<Payload>, AppError> {
        let mut builder = HttpRequest::builder().method("POST").uri("/");
        if json {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        ValidatedJson::<Payload>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(payload) = extract(r#"{"name":"Sunflowers"}"#, true).await.unwrap();
        assert_eq!(payload.name, "Sunflowers");
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request_with_details() {
        let err = extract(r#"{"name":"ab"}"#, true).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        assert_eq!(details["name"], vec!["Too short.".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_field_is_named() {
        let err = extract("{}", true).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.details.unwrap().contains_key("name"));
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let err = extract(r#"{"name":"Sunflowers"}"#, false).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().contains("Content-Type"));
    }
}
