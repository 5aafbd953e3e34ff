use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::hash_password;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub expires_at: i64,
}

/// 邮箱统一去空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Admin {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, email, password_hash
            FROM admins
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// 仅供开通管理员账号使用
    pub async fn create(pool: &PgPool, email: &str, password: &str) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password);

        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash
            "#,
        )
        .bind(&id)
        .bind(normalize_email(email))
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created admin: {}", admin.email);
        Ok(admin)
    }
}
