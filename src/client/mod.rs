//! 访问 OnTheWay 接口的客户端，会话状态由调用方注入的 [`SessionContext`] 管理

mod session;

pub use session::{SessionContext, random_nickname};

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::location::{SiblingNavigator, resolve_siblings};
use crate::routes::{
    MessageResponse,
    auth::LoginResponse,
    comment::Comment,
    photo::{Photo, PhotoGroupResponse, UpdatePhotoRequest},
};
use crate::utils::{ApiResponse, error_codes};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status} (code {code}): {msg}")]
    Api { status: u16, code: i32, msg: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("nickname is not set")]
    MissingNickname,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

/// 解析统一响应结构，非 0 错误码或非 2xx 状态都算失败
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ClientError> {
    match serde_json::from_str::<ApiResponse<T>>(text) {
        Ok(ApiResponse {
            code: error_codes::SUCCESS,
            resp_data: Some(data),
            ..
        }) if status.is_success() => Ok(data),
        Ok(envelope) => Err(ClientError::Api {
            status: status.as_u16(),
            code: envelope.code,
            msg: envelope.msg,
        }),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(ClientError::Api {
            status: status.as_u16(),
            code: error_codes::INTERNAL_ERROR,
            msg: text.to_string(),
        }),
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.session.token() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send<T: DeserializeOwned>(&mut self, rb: RequestBuilder) -> Result<T, ClientError> {
        let resp = rb.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED && self.session.is_logged_in() {
            tracing::info!("Token rejected by server, clearing session");
            self.session.clear_token()?;
        }
        let text = resp.text().await?;
        decode_envelope(status, &text)
    }

    pub async fn list_photos(&mut self) -> Result<Vec<Photo>, ClientError> {
        let rb = self.request(Method::GET, "/photos");
        self.send(rb).await
    }

    /// `gcj02` 为 true 时服务端把国内坐标转成 GCJ-02
    pub async fn photo_groups(&mut self, gcj02: bool) -> Result<Vec<PhotoGroupResponse>, ClientError> {
        let path = if gcj02 { "/photos/groups?coord=gcj02" } else { "/photos/groups" };
        let rb = self.request(Method::GET, path);
        self.send(rb).await
    }

    pub async fn get_photo(&mut self, id: &str) -> Result<Photo, ClientError> {
        let rb = self.request(Method::GET, &format!("/photos/{}", id));
        self.send(rb).await
    }

    pub async fn photo_comments(&mut self, photo_id: &str) -> Result<Vec<Comment>, ClientError> {
        let rb = self.request(Method::GET, &format!("/photos/{}/comments", photo_id));
        self.send(rb).await
    }

    /// 用会话里的昵称发表留言
    pub async fn post_comment(&mut self, photo_id: &str, content: &str) -> Result<Comment, ClientError> {
        let nickname = self
            .session
            .nickname()
            .ok_or(ClientError::MissingNickname)?
            .to_string();
        let rb = self
            .request(Method::POST, &format!("/photos/{}/comments", photo_id))
            .json(&json!({ "nickname": nickname, "content": content.trim() }));
        self.send(rb).await
    }

    /// 登录成功后令牌写入会话
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let rb = self
            .request(Method::POST, "/auth/login")
            .json(&json!({ "email": email, "password": password }));
        let resp: LoginResponse = self.send(rb).await?;
        self.session.set_token(resp.token.clone())?;
        Ok(resp)
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session.clear_token()
    }

    pub async fn update_photo(
        &mut self,
        id: &str,
        update: &UpdatePhotoRequest,
    ) -> Result<Photo, ClientError> {
        let rb = self
            .request(Method::PUT, &format!("/photos/{}", id))
            .json(update);
        self.send(rb).await
    }

    pub async fn delete_photo(&mut self, id: &str) -> Result<MessageResponse, ClientError> {
        let rb = self.request(Method::DELETE, &format!("/photos/{}", id));
        self.send(rb).await
    }

    pub async fn list_comments(&mut self, photo_id: Option<&str>) -> Result<Vec<Comment>, ClientError> {
        let mut rb = self.request(Method::GET, "/comments");
        if let Some(photo_id) = photo_id {
            rb = rb.query(&[("photoId", photo_id)]);
        }
        self.send(rb).await
    }

    pub async fn set_comment_hidden(&mut self, id: &str, hidden: bool) -> Result<Comment, ClientError> {
        let rb = self
            .request(Method::PATCH, &format!("/comments/{}", id))
            .json(&json!({ "hidden": hidden }));
        self.send(rb).await
    }

    pub async fn delete_comment(&mut self, id: &str) -> Result<MessageResponse, ClientError> {
        let rb = self.request(Method::DELETE, &format!("/comments/{}", id));
        self.send(rb).await
    }

    /// 详情页翻页：有显式列表就原样使用，否则拉全部照片按同地点过滤
    pub async fn siblings(
        &mut self,
        photo_id: &str,
        explicit: Option<Vec<String>>,
    ) -> Result<SiblingNavigator, ClientError> {
        let siblings = match explicit {
            Some(ids) => ids,
            None => {
                let current = self.get_photo(photo_id).await?;
                let all = self.list_photos().await?;
                resolve_siblings(&current, None, &all)
            }
        };
        Ok(SiblingNavigator::new(photo_id, siblings))
    }
}
