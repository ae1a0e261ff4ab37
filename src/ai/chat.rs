//! 聊天会话
//!
//! Gemini REST 接口本身无状态，会话上下文由本地镜像的消息记录维护：
//! 每次发送都会带上完整历史，只有收到模型回复后才追加到记录中。

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::AiError;
use super::generative::GenerativeModel;
use super::protocol::Content;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// 界面上显示的角色名（model 显示为 assistant）
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "assistant",
        }
    }
}

/// 聊天消息，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    text: String,
    /// 创建时间（Unix 毫秒）
    created_at: i64,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// 本地时间 `HH:MM:SS`，用于历史记录显示
    pub fn time_label(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.created_at)
            .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string())
    }

    pub(crate) fn to_content(&self) -> Content {
        Content::text(self.role, self.text.clone())
    }
}

/// 会话句柄标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 聊天会话
///
/// 消息记录只追加；整体清空通过创建新会话完成。
#[derive(Debug)]
pub struct ChatSession {
    id: SessionId,
    model: GenerativeModel,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub(crate) fn new(model: GenerativeModel, history: Vec<ChatMessage>) -> Self {
        let id = SessionId::new();
        info!(
            "Chat session {} started (model: {}, history: {} messages)",
            id,
            model.config().model,
            history.len()
        );
        Self { id, model, history }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 当前消息记录（按对话顺序）
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// 发送一条用户消息并返回模型回复
    ///
    /// 成功时依次追加用户消息和模型回复；失败时记录保持不变。
    /// 文本是否为空由调用方检查。
    pub async fn send_message(&mut self, text: &str) -> Result<ChatMessage, AiError> {
        let prompt = ChatMessage::user(text);

        let mut contents: Vec<Content> =
            self.history.iter().map(ChatMessage::to_content).collect();
        contents.push(prompt.to_content());

        debug!(
            "Session {}: sending message ({} chars, {} prior turns)",
            self.id,
            text.chars().count(),
            self.history.len()
        );

        let reply_text = self.model.generate(contents).await.map_err(|e| {
            warn!("Session {}: send failed: {}", self.id, e);
            e
        })?;

        let reply = ChatMessage::model(reply_text);
        self.history.push(prompt);
        self.history.push(reply.clone());

        Ok(reply)
    }
}
