use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_JWT_SECRET: &str = "dev-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub upload_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub photo_cache_secs: u64,
}

impl Config {
    /// 除数据库地址外全部使用默认值
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            redis_url: "redis://127.0.0.1/".into(),
            jwt_secret: DEFAULT_JWT_SECRET.into(),
            jwt_expiration_secs: 168 * 3600,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            server_host: "::".into(),
            server_port: 4000,
            api_base_uri: String::new(),
            upload_dir: PathBuf::from("uploads"),
            cors_origin: None,
            photo_cache_secs: 60,
        }
    }

    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let mut config = Config::with_database_url(env::var("DATABASE_URL")?);

        if let Ok(url) = env::var("REDIS_URL") {
            config.redis_url = url;
        }
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        if let Ok(v) = env::var("JWT_EXPIRATION") {
            let hours = v.trim_end_matches('h').parse::<u64>().unwrap_or(168);
            config.jwt_expiration_secs = hours * 3600;
        }
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server_host = v;
        }
        if let Ok(v) = env::var("PORT") {
            config.server_port = v.parse().unwrap_or(4000);
        }
        if let Ok(v) = env::var("API_BASE_URI") {
            let base = v.trim().trim_matches('/');
            config.api_base_uri = if base.is_empty() {
                String::new()
            } else {
                format!("/{}", base)
            };
        }
        if let Ok(v) = env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(v);
        }
        config.cors_origin = env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty());
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW") {
            config.rate_limit_window_secs = v.parse().unwrap_or(60);
        }
        if let Ok(v) = env::var("RATE_LIMIT_REQUESTS") {
            config.rate_limit_requests = v.parse().unwrap_or(100);
        }
        if let Ok(v) = env::var("PHOTO_CACHE_SECS") {
            config.photo_cache_secs = v.parse().unwrap_or(60);
        }

        Ok(config)
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn photo_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.photo_cache_secs)
    }
}
