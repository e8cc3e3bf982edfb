use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deployment::DeploymentError;
use services::services::category::CategoryServiceError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Category(#[from] CategoryServiceError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Category(err) => match err {
                CategoryServiceError::NotFound => (StatusCode::NOT_FOUND, "CategoryNotFound"),
                CategoryServiceError::SlugTaken(_) => (StatusCode::CONFLICT, "SlugTaken"),
                CategoryServiceError::NameRequired
                | CategoryServiceError::InvalidSlug(_)
                | CategoryServiceError::ParentNotFound
                | CategoryServiceError::InvalidParent
                | CategoryServiceError::ToolNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "InvalidCategory")
                }
                CategoryServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
                }
            },
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        let message = if status_code.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
            "An internal error occurred. Please try again.".to_string()
        } else {
            tracing::debug!(error = %self, error_type, "Request rejected");
            self.to_string()
        };

        let response = ApiResponse::<()>::error(&message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_errors_map_to_client_statuses() {
        let cases = [
            (CategoryServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                CategoryServiceError::SlugTaken("ai".to_string()),
                StatusCode::CONFLICT,
            ),
            (CategoryServiceError::NameRequired, StatusCode::BAD_REQUEST),
            (CategoryServiceError::InvalidParent, StatusCode::BAD_REQUEST),
            (
                CategoryServiceError::ToolNotFound(uuid::Uuid::nil()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_database_errors_are_internal() {
        let response = ApiError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
