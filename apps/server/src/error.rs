use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quoteflow_core::errors::{DatabaseError, Error as CoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::MarketData(_) => StatusCode::BAD_GATEWAY,
                CoreError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
                CoreError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::JobTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{} {}", status, self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quoteflow_core::errors::ValidationError;
    use quoteflow_market_data::MarketDataError;

    #[test]
    fn test_status_mapping() {
        let validation: ApiError =
            CoreError::from(ValidationError::MissingField("symbol".into())).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let provider: ApiError = CoreError::from(MarketDataError::RateLimited {
            provider: "YAHOO".into(),
        })
        .into();
        assert_eq!(provider.status(), StatusCode::BAD_GATEWAY);

        let unknown: ApiError = CoreError::from(MarketDataError::SymbolNotFound("ZZZ".into())).into();
        assert_eq!(unknown.status(), StatusCode::BAD_GATEWAY);

        assert_eq!(
            ApiError::NotFound("no bars".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::Unexpected("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
