//! Response mapping shared by the domain routers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::service::ServiceError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<Json<T>, ServiceError>;

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Notification(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

pub(crate) fn created<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RuleViolation;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (
                ServiceError::Rule(RuleViolation::SectionFull),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Store(StoreError::NotFound {
                    entity: "section",
                    id: "4".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Store(StoreError::Conflict("enrollment".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Store(StoreError::Unavailable("offline".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
