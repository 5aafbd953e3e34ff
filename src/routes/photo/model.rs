use chrono::{DateTime, NaiveDate, Utc};
use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cache::PhotoCacheOperations;
use crate::error::AppError;
use crate::location::Located;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_at: Option<DateTime<Utc>>,
    pub location: GeoPoint,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Located for Photo {
    fn id(&self) -> &str {
        &self.id
    }

    fn lat(&self) -> f64 {
        self.location.lat
    }

    fn lng(&self) -> f64 {
        self.location.lng
    }
}

// 数据库行，经纬度拆成两列
#[derive(Debug, FromRow)]
struct PhotoRow {
    id: String,
    title: String,
    description: String,
    place_name: String,
    shot_at: Option<DateTime<Utc>>,
    lat: f64,
    lng: f64,
    image_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            place_name: row.place_name,
            shot_at: row.shot_at,
            location: GeoPoint {
                lat: row.lat,
                lng: row.lng,
            },
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PHOTO_COLUMNS: &str =
    "id, title, description, place_name, shot_at, lat, lng, image_url, created_at, updated_at";

/// 上传时的照片字段（multipart 表单解析并校验之后）
#[derive(Debug)]
pub struct NewPhoto {
    pub title: String,
    pub description: String,
    pub place_name: String,
    pub shot_at: Option<DateTime<Utc>>,
    pub location: GeoPoint,
    pub image_url: String,
}

/// 管理员编辑照片，未给出的字段保持不变
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    /// 空字符串表示清除拍摄时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// 校验后的编辑内容
#[derive(Debug, Default, PartialEq)]
pub struct PhotoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub place_name: Option<String>,
    /// None: 不修改；Some(None): 清除；Some(Some(t)): 设置
    pub shot_at: Option<Option<DateTime<Utc>>>,
    pub location: Option<GeoPoint>,
}

impl TryFrom<UpdatePhotoRequest> for PhotoUpdate {
    type Error = AppError;

    fn try_from(req: UpdatePhotoRequest) -> Result<Self, Self::Error> {
        let shot_at = match req.shot_at {
            None => None,
            Some(s) if s.trim().is_empty() => Some(None),
            Some(s) => Some(Some(parse_shot_at(&s)?)),
        };
        // 经纬度必须成对修改
        let location = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) => Some(validate_point(lat, lng)?),
            _ => None,
        };

        Ok(PhotoUpdate {
            title: req.title,
            description: req.description,
            place_name: req.place_name,
            shot_at,
            location,
        })
    }
}

pub fn validate_point(lat: f64, lng: f64) -> Result<GeoPoint, AppError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(AppError::validation("请提供有效的经纬度"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::validation("纬度范围为 -90 至 90"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::validation("经度范围为 -180 至 180"));
    }
    Ok(GeoPoint { lat, lng })
}

/// 解析表单里的经纬度字符串
pub fn parse_point(lat: Option<&str>, lng: Option<&str>) -> Result<GeoPoint, AppError> {
    let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<f64>().ok());
    match (parse(lat), parse(lng)) {
        (Some(lat), Some(lng)) => validate_point(lat, lng),
        _ => Err(AppError::validation("请提供有效的经纬度")),
    }
}

/// 拍摄时间：RFC 3339 或 `YYYY-MM-DD`（按 UTC 零点）
pub fn parse_shot_at(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| AppError::validation("拍摄时间格式无效"))
}

impl Photo {
    /// 全部照片，按创建时间倒序；优先读缓存
    pub async fn list_all(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        cache_ttl: Duration,
    ) -> Result<Vec<Self>, sqlx::Error> {
        // 先取代数，读库期间有写操作时不会把旧列表写回缓存
        let generation = PhotoCacheOperations::generation(redis).await;
        if let Some(photos) = PhotoCacheOperations::get_photo_list(redis).await {
            return Ok(photos);
        }

        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;
        let photos: Vec<Photo> = rows.into_iter().map(Photo::from).collect();

        if let Some(generation) = generation {
            PhotoCacheOperations::set_photo_list(redis, &photos, cache_ttl, generation).await;
        }

        Ok(photos)
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Photo::from))
    }

    pub async fn create(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        new: NewPhoto,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            r#"
            INSERT INTO photos (id, title, description, place_name, shot_at, lat, lng, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {PHOTO_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.place_name)
        .bind(new.shot_at)
        .bind(new.location.lat)
        .bind(new.location.lng)
        .bind(&new.image_url)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created photo: {}", id);
        PhotoCacheOperations::invalidate_photo_list(redis).await;

        Ok(row.into())
    }

    pub async fn update(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        id: &str,
        update: PhotoUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (touch_shot_at, shot_at) = match update.shot_at {
            Some(v) => (true, v),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            r#"
            UPDATE photos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                place_name = COALESCE($4, place_name),
                shot_at = CASE WHEN $5 THEN $6 ELSE shot_at END,
                lat = COALESCE($7, lat),
                lng = COALESCE($8, lng),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PHOTO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.place_name)
        .bind(touch_shot_at)
        .bind(shot_at)
        .bind(update.location.map(|p| p.lat))
        .bind(update.location.map(|p| p.lng))
        .fetch_optional(pool)
        .await?;

        if row.is_some() {
            PhotoCacheOperations::invalidate_photo_list(redis).await;
        }

        Ok(row.map(Photo::from))
    }

    /// 删除照片并连带删除它的留言，返回是否删除了照片
    pub async fn delete(
        pool: &PgPool,
        redis: &Arc<RedisClient>,
        id: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let comments = sqlx::query("DELETE FROM comments WHERE photo_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::info!("Deleted photo {} with {} comments", id, comments);
        PhotoCacheOperations::invalidate_photo_list(redis).await;

        Ok(true)
    }
}
