use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    utils::{generate_token, success_to_api_response, verify_password},
};

use super::model::{Admin, LoginRequest, LoginResponse, normalize_email};

const LOGIN_FAILED: &str = "邮箱或密码错误";

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("请提供邮箱和密码"));
    }

    let Some(admin) = Admin::find_by_email(&state.pool, &email).await? else {
        return Err(AppError::AuthFailed(LOGIN_FAILED.to_string()));
    };

    // PBKDF2 十万次迭代，放到阻塞线程池里做
    let stored = admin.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {:?}", e);
            AppError::internal("登录失败")
        })?;

    match verified {
        Ok(true) => {}
        Ok(false) => return Err(AppError::AuthFailed(LOGIN_FAILED.to_string())),
        Err(e) => {
            tracing::error!("Stored password hash for {} is unusable: {}", admin.email, e);
            return Err(AppError::AuthFailed(LOGIN_FAILED.to_string()));
        }
    }

    let (token, expires_at) = generate_token(&admin.id, &admin.email, &state.config)
        .map_err(|e| {
            tracing::error!("Failed to generate token: {:?}", e);
            AppError::internal("生成令牌失败")
        })?;

    tracing::info!("Admin logged in: {}", admin.email);
    Ok((
        StatusCode::OK,
        success_to_api_response(LoginResponse {
            token,
            email: admin.email,
            expires_at,
        }),
    ))
}
