//! HTTP error mapping
//!
//! Every handler returns `Result<_, ApiError>`, so each request produces
//! exactly one response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use purse_core::Error;

/// A core error on its way to becoming a response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::LENGTH_REQUIRED,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the server log
        let message = if self.0.is_client_error() {
            self.0.detail()
        } else {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::LENGTH_REQUIRED),
            (Error::conflict("dup"), StatusCode::CONFLICT),
            (Error::not_found("none"), StatusCode::NOT_FOUND),
            (Error::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (Error::database("boom"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Config("missing".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = ApiError::from(Error::database("table users is corrupt")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
