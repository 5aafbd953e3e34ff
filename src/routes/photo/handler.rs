use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Json, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult},
    location::{
        LocationGroup, NavigationSummary, SiblingNavigator, group_by_location, resolve_siblings,
        to_display_coordinate,
    },
    routes::MessageResponse,
    utils::{Claims, success_to_api_response},
};

use super::model::{NewPhoto, Photo, PhotoUpdate, UpdatePhotoRequest, parse_point, parse_shot_at};
use super::upload::save_upload;

const DEFAULT_TITLE: &str = "未命名";

#[derive(Debug, Deserialize)]
pub struct GroupsQuery {
    /// `gcj02` 时把国内的代表坐标转成 GCJ-02
    pub coord: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SiblingsQuery {
    /// 逗号分隔的显式兄弟列表，例如从地图红点进入时携带
    pub ids: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoGroupResponse {
    pub key: String,
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    pub photo_ids: Vec<String>,
    pub photos: Vec<Photo>,
}

impl PhotoGroupResponse {
    fn from_group(group: LocationGroup<Photo>, gcj02: bool) -> Self {
        let (lat, lng) = if gcj02 {
            to_display_coordinate(group.lat, group.lng)
        } else {
            (group.lat, group.lng)
        };
        Self {
            count: group.len(),
            photo_ids: group.photo_ids(),
            key: group.key,
            lat,
            lng,
            photos: group.photos,
        }
    }
}

/// 解析 `?ids=a,b,c`：去掉空白和空项；没有有效 ID 时按地点推导
fn parse_sibling_ids(raw: Option<&str>) -> Option<Vec<String>> {
    let ids: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() { None } else { Some(ids) }
}

async fn load_photo(state: &AppState, id: &str) -> AppResult<Photo> {
    Photo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("未找到该照片"))
}

pub async fn list_photos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let photos = Photo::list_all(&state.pool, &state.redis, state.config.photo_cache_ttl()).await?;
    Ok((StatusCode::OK, success_to_api_response(photos)))
}

pub async fn photo_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupsQuery>,
) -> AppResult<impl IntoResponse> {
    let gcj02 = match query.coord.as_deref() {
        None | Some("wgs84") => false,
        Some("gcj02") => true,
        Some(other) => {
            return Err(AppError::validation(format!("不支持的坐标系: {}", other)));
        }
    };

    let photos = Photo::list_all(&state.pool, &state.redis, state.config.photo_cache_ttl()).await?;
    let groups = group_by_location(photos)
        .into_iter()
        .map(|g| PhotoGroupResponse::from_group(g, gcj02))
        .collect::<Vec<_>>();

    Ok((StatusCode::OK, success_to_api_response(groups)))
}

pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let photo = load_photo(&state, &id).await?;
    Ok((StatusCode::OK, success_to_api_response(photo)))
}

pub async fn photo_siblings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SiblingsQuery>,
) -> AppResult<impl IntoResponse> {
    let current = load_photo(&state, &id).await?;

    let siblings = match parse_sibling_ids(query.ids.as_deref()) {
        Some(ids) => resolve_siblings::<Photo, _>(&current, Some(ids), &[]),
        None => {
            let all =
                Photo::list_all(&state.pool, &state.redis, state.config.photo_cache_ttl()).await?;
            resolve_siblings(&current, None, &all)
        }
    };

    let summary: NavigationSummary = SiblingNavigator::new(id, siblings).summary();
    Ok((StatusCode::OK, success_to_api_response(summary)))
}

pub async fn create_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("表单解析失败: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("读取图片失败: {}", e)))?;
            image = Some((file_name, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("表单解析失败: {}", e)))?;
            fields.insert(name, value);
        }
    }

    let (file_name, bytes) = match image {
        Some((name, bytes)) if !bytes.is_empty() => (name, bytes),
        _ => return Err(AppError::validation("请上传图片")),
    };
    let location = parse_point(
        fields.get("lat").map(String::as_str),
        fields.get("lng").map(String::as_str),
    )?;
    let shot_at = match fields.get("shotAt").map(|s| s.trim()) {
        Some(s) if !s.is_empty() => Some(parse_shot_at(s)?),
        _ => None,
    };
    let non_empty = |key: &str| fields.get(key).filter(|v| !v.trim().is_empty()).cloned();

    let image_url = save_upload(&state.config.upload_dir, file_name.as_deref(), &bytes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save upload: {:?}", e);
            AppError::internal("上传失败")
        })?;

    let new = NewPhoto {
        title: non_empty("title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: non_empty("description").unwrap_or_default(),
        place_name: non_empty("placeName").unwrap_or_default(),
        shot_at,
        location,
        image_url,
    };

    let photo = Photo::create(&state.pool, &state.redis, new).await?;
    tracing::info!("Photo {} uploaded by {}", photo.id, claims.email);

    Ok((StatusCode::CREATED, success_to_api_response(photo)))
}

pub async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePhotoRequest>,
) -> AppResult<impl IntoResponse> {
    let update = PhotoUpdate::try_from(req)?;

    match Photo::update(&state.pool, &state.redis, &id, update).await? {
        Some(photo) => Ok((StatusCode::OK, success_to_api_response(photo))),
        None => Err(AppError::not_found("未找到该照片")),
    }
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !Photo::delete(&state.pool, &state.redis, &id).await? {
        return Err(AppError::not_found("未找到该照片"));
    }
    Ok((
        StatusCode::OK,
        success_to_api_response(MessageResponse::new("已删除")),
    ))
}
