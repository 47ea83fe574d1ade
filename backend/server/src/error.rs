use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use registry::{Envelope, rating::InvalidRating};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing required fields")]
    MissingFields,

    #[error("{0}")]
    InvalidField(&'static str),

    #[error(transparent)]
    InvalidRating(#[from] InvalidRating),

    #[error("School not found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload
            | AppError::MissingFields
            | AppError::InvalidField(_)
            | AppError::InvalidRating(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Database(ref e) => {
                error!("Database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(Envelope::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AppError::MissingFields, StatusCode::BAD_REQUEST, "Missing required fields")]
    #[case(AppError::InvalidRating(InvalidRating), StatusCode::BAD_REQUEST, "Rating must be a number between 1 and 5")]
    #[case(AppError::NotFound, StatusCode::NOT_FOUND, "School not found")]
    #[case(AppError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")]
    #[case(AppError::Database(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR, "Database error")]
    #[tokio::test]
    async fn test_error_envelope(
        #[case] error: AppError,
        #[case] status: StatusCode,
        #[case] message: &str,
    ) {
        let response = error.into_response();
        assert_eq!(response.status(), status);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], message);
    }
}
