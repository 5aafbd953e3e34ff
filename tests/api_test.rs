use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use ontheway::{
    AppState, config::Config, router::create_router, utils::generate_token,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::util::ServiceExt; // for `oneshot`

// 数据库连接是惰性的，这里只测不会访问数据库的路径
fn test_app(upload_dir: &std::path::Path) -> (Router, Config) {
    let mut config = Config::with_database_url("postgres://localhost/ontheway_test");
    config.upload_dir = upload_dir.to_path_buf();

    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let redis = redis::Client::open(config.redis_url.clone()).expect("redis client");

    let state = AppState {
        pool,
        config: config.clone(),
        redis: Arc::new(redis),
    };
    (create_router(state), config)
}

fn admin_token(config: &Config) -> String {
    generate_token("admin-1", "admin@example.com", config).unwrap().0
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_reports_service_name() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path());

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["code"], 0);
    assert_eq!(json["resp_data"]["status"], "ok");
    assert_eq!(json["resp_data"]["service"], "ontheway-server");
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path());

    for (method, uri) in [
        ("GET", "/comments"),
        ("PATCH", "/comments/c1"),
        ("DELETE", "/comments/c1"),
        ("PUT", "/photos/p1"),
        ("DELETE", "/photos/p1"),
        ("POST", "/photos"),
    ] {
        let resp = app
            .clone()
            .oneshot(json_request(method, uri, None, Value::Null))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        let json = body_json(resp).await;
        assert_eq!(json["code"], 1002);
        assert_eq!(json["msg"], "未登录或登录已过期");
    }
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, config) = test_app(dir.path());

    let mut other = config.clone();
    other.jwt_secret = "not-the-server-secret".into();
    let forged = admin_token(&other);

    let resp = app
        .oneshot(json_request("GET", "/comments", Some(&forged), Value::Null))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path());

    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "email": "  ", "password": "secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["code"], 1000);
    assert_eq!(json["msg"], "请提供邮箱和密码");
}

#[tokio::test]
async fn comment_validation_happens_before_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path());

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/photos/p1/comments",
            None,
            serde_json::json!({ "nickname": " ", "content": "hello" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "请填写昵称");

    let resp = app
        .oneshot(json_request(
            "POST",
            "/photos/p1/comments",
            None,
            serde_json::json!({ "nickname": "旅人" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "请填写留言内容");
}

#[tokio::test]
async fn hidden_flag_is_required() {
    let dir = tempfile::tempdir().unwrap();
    let (app, config) = test_app(dir.path());
    let token = admin_token(&config);

    let resp = app
        .oneshot(json_request(
            "PATCH",
            "/comments/c1",
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "请提供 hidden: true/false");
}

#[tokio::test]
async fn photo_update_rejects_out_of_range_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let (app, config) = test_app(dir.path());
    let token = admin_token(&config);

    let resp = app
        .oneshot(json_request(
            "PUT",
            "/photos/p1",
            Some(&token),
            serde_json::json!({ "lat": 95.0, "lng": 116.4 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "纬度范围为 -90 至 90");
}

#[tokio::test]
async fn unknown_coordinate_system_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/photos/groups?coord=bd09")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

#[tokio::test]
async fn upload_without_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, config) = test_app(dir.path());
    let token = admin_token(&config);

    let boundary = "X-ONTHEWAY-BOUNDARY";
    let body = multipart_body(boundary, &[("title", "外滩"), ("lat", "31.24"), ("lng", "121.49")]);
    let req = Request::builder()
        .method("POST")
        .uri("/photos")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["msg"], "请上传图片");

    // 校验失败时不落盘
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn uploaded_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1700000000000-abc.jpg"), b"jpeg bytes").unwrap();
    let (app, _) = test_app(dir.path());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/uploads/1700000000000-abc.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"jpeg bytes");
}
