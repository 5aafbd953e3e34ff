use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("未登录或登录已过期")]
    Unauthorized,
    #[error("{0}")]
    AuthFailed(String),
    #[error("{0}")]
    NotFound(String),
    #[error("请求过于频繁，请在{0}秒后重试")]
    RateLimited(u64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> i32 {
        match self {
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::Unauthorized | AppError::AuthFailed(_) => error_codes::AUTH_FAILED,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::RateLimited(_) => error_codes::RATE_LIMIT,
            AppError::Database(_) | AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 数据库错误的细节只进日志，不返回给客户端
        let msg = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "内部服务器错误".to_string()
            }
            other => other.to_string(),
        };

        (status, error_to_api_response::<()>(self.code(), msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited(60).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limit_message_names_the_window() {
        assert_eq!(AppError::RateLimited(60).to_string(), "请求过于频繁，请在60秒后重试");
    }
}
