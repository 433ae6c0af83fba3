use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cvp_claims::naming::INVALID_NAMING_MESSAGE;
use cvp_claims::ClaimsError;
use serde_json::json;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Claims(#[from] ClaimsError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Claims(e) => match e {
                ClaimsError::InvalidIdentifier { .. } | ClaimsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ClaimsError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                ClaimsError::Store(_) | ClaimsError::Serialization(_) | ClaimsError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Claims(ClaimsError::InvalidIdentifier { .. }) => json!({
                "error": self.to_string(),
                "detail": INVALID_NAMING_MESSAGE,
                "status": status.as_u16(),
            }),
            _ => json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
