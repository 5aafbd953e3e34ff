use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::ClientError;

const ADJECTIVES: [&str; 10] = [
    "晴朗", "微风", "远行", "拾光", "路过", "漫游", "静默", "浮云", "星野", "山间",
];
const NOUNS: [&str; 10] = [
    "旅人", "过客", "看客", "路人", "行者", "观者", "访客", "路人甲", "小透明", "过路人",
];

/// 随机昵称（形容词 + 的 + 名词）
pub fn random_nickname() -> String {
    let mut rng = rand::thread_rng();
    let a = ADJECTIVES.choose(&mut rng).copied().unwrap_or("路过");
    let b = NOUNS.choose(&mut rng).copied().unwrap_or("旅人");
    format!("{}的{}", a, b)
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

/// 客户端会话：管理员令牌和游客昵称，持久化到一个 JSON 文件。
///
/// 由调用方显式创建并传给 [`super::ApiClient`]，启动时 [`SessionContext::load`]
/// 读取持久化的值，收到 401 或登出时 [`SessionContext::clear_token`]。
#[derive(Debug, Clone)]
pub struct SessionContext {
    path: Option<PathBuf>,
    state: StoredSession,
}

impl SessionContext {
    /// 不落盘的会话
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: StoredSession::default(),
        }
    }

    /// 读取持久化的会话；文件不存在时得到空会话
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => StoredSession::default(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSession::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Loaded session from {}", path.display());
        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn nickname(&self) -> Option<&str> {
        self.state.nickname.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.token.is_some()
    }

    pub fn set_token(&mut self, token: impl Into<String>) -> Result<(), ClientError> {
        self.state.token = Some(token.into());
        self.save()
    }

    /// 登出或收到 401 时调用
    pub fn clear_token(&mut self) -> Result<(), ClientError> {
        if self.state.token.take().is_some() {
            tracing::debug!("Cleared session token");
        }
        self.save()
    }

    /// 昵称去掉首尾空白，空白昵称忽略并返回 false
    pub fn set_nickname(&mut self, nickname: &str) -> Result<bool, ClientError> {
        let trimmed = nickname.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        self.state.nickname = Some(trimmed.to_string());
        self.save()?;
        Ok(true)
    }

    /// 没有昵称时生成一个随机昵称
    pub fn ensure_nickname(&mut self) -> Result<String, ClientError> {
        if let Some(n) = &self.state.nickname {
            return Ok(n.clone());
        }
        let nickname = random_nickname();
        self.set_nickname(&nickname)?;
        Ok(nickname)
    }

    pub fn save(&self) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&self.state)?)?;
        Ok(())
    }
}
