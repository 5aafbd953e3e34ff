/// 缓存模块
/// 照片列表缓存与缓存键生成函数
pub mod keys;

use redis::{AsyncCommands, Client as RedisClient};
use std::sync::Arc;
use std::time::Duration;

use crate::routes::photo::Photo;

/// 照片列表缓存操作。
///
/// Redis 不可用时只记日志，调用方直接读数据库。
pub struct PhotoCacheOperations;

impl PhotoCacheOperations {
    pub async fn get_photo_list(redis: &Arc<RedisClient>) -> Option<Vec<Photo>> {
        let mut conn = match redis.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Redis unavailable, skipping photo cache: {}", e);
                return None;
            }
        };

        let cached: redis::RedisResult<Option<String>> = conn.get(keys::PHOTO_LIST_KEY).await;
        match cached {
            Ok(Some(json_str)) => match serde_json::from_str::<Vec<Photo>>(&json_str) {
                Ok(photos) => {
                    tracing::debug!("Get photo list from cache: {} photos", photos.len());
                    Some(photos)
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable photo cache: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read photo cache: {}", e);
                None
            }
        }
    }

    /// 当前缓存代数，读库之前取；Redis 不可用时为 None
    pub async fn generation(redis: &Arc<RedisClient>) -> Option<u64> {
        let mut conn = redis.get_multiplexed_async_connection().await.ok()?;
        let current: redis::RedisResult<Option<u64>> =
            conn.get(keys::PHOTO_LIST_GENERATION_KEY).await;
        match current {
            Ok(v) => Some(v.unwrap_or(0)),
            Err(e) => {
                tracing::warn!("Failed to read photo cache generation: {}", e);
                None
            }
        }
    }

    /// 代数仍等于 `generation` 时才写入，读库期间有写操作就放弃。返回是否写入
    pub async fn set_photo_list(
        redis: &Arc<RedisClient>,
        photos: &[Photo],
        ttl: Duration,
        generation: u64,
    ) -> bool {
        if ttl.is_zero() {
            return false;
        }
        match Self::store_if_current(redis, photos, ttl, generation).await {
            Ok(true) => {
                tracing::debug!("Set photo list to cache");
                true
            }
            Ok(false) => {
                tracing::debug!("Photo list changed while loading, not caching");
                false
            }
            Err(e) => {
                tracing::warn!("Failed to write photo cache: {}", e);
                false
            }
        }
    }

    async fn store_if_current(
        redis: &Arc<RedisClient>,
        photos: &[Photo],
        ttl: Duration,
        generation: u64,
    ) -> redis::RedisResult<bool> {
        let json_str = serde_json::to_string(photos).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "photo list serialization failed",
                e.to_string(),
            ))
        })?;
        let mut conn = redis.get_multiplexed_async_connection().await?;

        // 比较代数和写入放在一个脚本里，保证原子性
        let script = redis::Script::new(
            r"
            local current = redis.call('GET', KEYS[1]) or '0'
            if current ~= ARGV[1] then
                return 0
            end
            redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
            return 1
            ",
        );
        let stored: i64 = script
            .key(keys::PHOTO_LIST_GENERATION_KEY)
            .key(keys::PHOTO_LIST_KEY)
            .arg(generation)
            .arg(json_str)
            .arg(ttl.as_secs())
            .invoke_async(&mut conn)
            .await?;
        Ok(stored == 1)
    }

    /// 照片新增、修改、删除后调用：代数加一并删除列表
    pub async fn invalidate_photo_list(redis: &Arc<RedisClient>) {
        if let Err(e) = Self::bump_generation(redis).await {
            tracing::warn!("Failed to invalidate photo cache: {}", e);
        }
    }

    async fn bump_generation(redis: &Arc<RedisClient>) -> redis::RedisResult<()> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .incr(keys::PHOTO_LIST_GENERATION_KEY, 1)
            .ignore()
            .del(keys::PHOTO_LIST_KEY)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
