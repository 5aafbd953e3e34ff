use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub photo_id: String,
    pub nickname: String,
    pub content: String,
    #[serde(default)]
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 游客发表留言
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// 去掉首尾空白后的留言内容
#[derive(Debug, PartialEq)]
pub struct NewComment {
    pub nickname: String,
    pub content: String,
}

impl TryFrom<CreateCommentRequest> for NewComment {
    type Error = AppError;

    fn try_from(req: CreateCommentRequest) -> Result<Self, Self::Error> {
        let nickname = req.nickname.unwrap_or_default().trim().to_string();
        let content = req.content.unwrap_or_default().trim().to_string();
        if nickname.is_empty() {
            return Err(AppError::validation("请填写昵称"));
        }
        if content.is_empty() {
            return Err(AppError::validation("请填写留言内容"));
        }
        Ok(NewComment { nickname, content })
    }
}

/// 管理员隐藏/显示留言
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SetHiddenRequest {
    #[serde(default)]
    pub hidden: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilter {
    pub photo_id: Option<String>,
}

const COMMENT_COLUMNS: &str = "id, photo_id, nickname, content, hidden, created_at, updated_at";

impl Comment {
    /// 某张照片下游客可见的留言，最新的在前
    pub async fn find_visible_by_photo(
        pool: &PgPool,
        photo_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE photo_id = $1 AND hidden = FALSE
            ORDER BY created_at DESC
            "#
        ))
        .bind(photo_id)
        .fetch_all(pool)
        .await
    }

    /// 管理员查看全部留言，可按照片筛选
    pub async fn find_all(
        pool: &PgPool,
        photo_id: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments
            WHERE $1::TEXT IS NULL OR photo_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(photo_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        photo_id: &str,
        new: NewComment,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (id, photo_id, nickname, content, hidden, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, NOW(), NOW())
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(photo_id)
        .bind(&new.nickname)
        .bind(&new.content)
        .fetch_one(pool)
        .await?;

        tracing::debug!("Created comment {} on photo {}", id, photo_id);
        Ok(comment)
    }

    pub async fn set_hidden(
        pool: &PgPool,
        id: &str,
        hidden: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET hidden = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(hidden)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
