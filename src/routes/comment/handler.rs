use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    routes::{MessageResponse, photo::Photo},
    utils::success_to_api_response,
};

use super::model::{Comment, CommentFilter, CreateCommentRequest, NewComment, SetHiddenRequest};

/// 某张照片下的留言列表（仅未隐藏，游客可见）
pub async fn list_photo_comments(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let comments = Comment::find_visible_by_photo(&state.pool, &photo_id).await?;
    Ok((StatusCode::OK, success_to_api_response(comments)))
}

/// 发表留言（游客，无需登录）
pub async fn create_photo_comment(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let new = NewComment::try_from(req)?;

    if Photo::find_by_id(&state.pool, &photo_id).await?.is_none() {
        return Err(AppError::not_found("未找到该照片"));
    }

    let comment = Comment::create(&state.pool, &photo_id, new).await?;
    Ok((StatusCode::CREATED, success_to_api_response(comment)))
}

/// 管理员：获取所有留言，可选按图片筛选
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> AppResult<impl IntoResponse> {
    let photo_id = filter.photo_id.as_deref().filter(|s| !s.is_empty());
    let comments = Comment::find_all(&state.pool, photo_id).await?;
    Ok((StatusCode::OK, success_to_api_response(comments)))
}

/// 管理员：隐藏/显示留言
pub async fn set_comment_hidden(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetHiddenRequest>,
) -> AppResult<impl IntoResponse> {
    let hidden = req
        .hidden
        .ok_or_else(|| AppError::validation("请提供 hidden: true/false"))?;

    match Comment::set_hidden(&state.pool, &id, hidden).await? {
        Some(comment) => Ok((StatusCode::OK, success_to_api_response(comment))),
        None => Err(AppError::not_found("未找到该留言")),
    }
}

/// 管理员：删除留言
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !Comment::delete(&state.pool, &id).await? {
        return Err(AppError::not_found("未找到该留言"));
    }
    Ok((
        StatusCode::OK,
        success_to_api_response(MessageResponse::new("已删除")),
    ))
}
