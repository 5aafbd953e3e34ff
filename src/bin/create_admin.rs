//! 创建第一个管理员账号（仅当该邮箱不存在时）。
//!
//! 需在 .env 中设置 DATABASE_URL、ADMIN_EMAIL、ADMIN_PASSWORD：
//! `cargo run --bin create_admin`

use std::env;
use std::process::ExitCode;

use ontheway::{
    MIGRATOR,
    routes::auth::{Admin, normalize_email},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();

    let email = env::var("ADMIN_EMAIL").map(|e| normalize_email(&e)).unwrap_or_default();
    let password = env::var("ADMIN_PASSWORD").unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        tracing::error!("请在 .env 中设置 ADMIN_EMAIL 和 ADMIN_PASSWORD");
        return ExitCode::FAILURE;
    }

    let Ok(database_url) = env::var("DATABASE_URL") else {
        tracing::error!("请在 .env 中设置 DATABASE_URL");
        return ExitCode::FAILURE;
    };
    let database_url = database_url.trim().replace(['\r', '\n'], "");
    if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
        tracing::error!("DATABASE_URL 格式错误，应以 postgres:// 或 postgresql:// 开头");
        return ExitCode::FAILURE;
    }

    match run(&database_url, &email, &password).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to create admin: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(database_url: &str, email: &str, password: &str) -> Result<(), sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    if Admin::find_by_email(&pool, email).await?.is_some() {
        tracing::info!("该邮箱已是管理员，无需创建：{}", email);
        return Ok(());
    }

    Admin::create(&pool, email, password).await?;
    tracing::info!("管理员账号创建成功，邮箱：{}", email);
    Ok(())
}
