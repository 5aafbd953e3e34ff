pub mod auth;
pub mod comment;
pub mod photo;

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::utils::success_to_api_response;

/// 只带一句提示的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    pub service: String,
    /// 服务器时间
    pub timestamp: i64,
}

/// 健康检查接口
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(HealthResponse {
            status: "ok".to_string(),
            service: "ontheway-server".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }),
    )
}
