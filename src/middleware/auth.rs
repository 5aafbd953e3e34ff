use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError, utils::verify_token};

/// 管理员接口鉴权：校验 `Authorization: Bearer <jwt>`，通过后把 Claims 放进请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(bearer.token(), &state.config).map_err(|e| {
        tracing::debug!("Rejected admin token: {}", e);
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
