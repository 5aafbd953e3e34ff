use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
    routes,
};

/// 上传图片的请求体上限
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// 游客可访问的路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/photos", get(routes::photo::list_photos))
        .route("/photos/groups", get(routes::photo::photo_groups))
        .route("/photos/{id}", get(routes::photo::get_photo))
        .route("/photos/{id}/siblings", get(routes::photo::photo_siblings))
        .route(
            "/photos/{id}/comments",
            get(routes::comment::list_photo_comments).post(routes::comment::create_photo_comment),
        )
}

// 需要管理员登录的路由
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/photos",
            post(routes::photo::create_photo).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/photos/{id}",
            axum::routing::put(routes::photo::update_photo).delete(routes::photo::delete_photo),
        )
        .route("/comments", get(routes::comment::list_comments))
        .route(
            "/comments/{id}",
            patch(routes::comment::set_comment_hidden).delete(routes::comment::delete_comment),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

/// 组装完整路由（不含限流，限流在 main 里按需加上）
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(admin_routes(state.clone()));

    let router = if state.config.api_base_uri.is_empty() {
        api
    } else {
        Router::new().nest(&state.config.api_base_uri, api)
    };

    router
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.config.cors_origin.as_deref()))
        .with_state(state)
}
