/// 照片列表缓存键
pub const PHOTO_LIST_KEY: &str = "photo:list";

/// 照片列表缓存代数，每次写照片后加一
pub const PHOTO_LIST_GENERATION_KEY: &str = "photo:list:generation";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成限流计数键
pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}
