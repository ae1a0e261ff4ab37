//! 会话状态
//!
//! 保存当前选中的模式和当前聊天会话，只存在于内存中，进程退出即丢失。
//! 由单一调用方通过 `&mut` 访问，不需要加锁。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::ai::{ChatSession, GenerativeModel};

/// 界面模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectedMode {
    #[default]
    ChatBot,
    ImageCaptioning,
    EmbedText,
    AskAnything,
}

impl SelectedMode {
    pub const ALL: [SelectedMode; 4] = [
        Self::ChatBot,
        Self::ImageCaptioning,
        Self::EmbedText,
        Self::AskAnything,
    ];

    /// 导航栏上的名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::ChatBot => "ChatBot",
            Self::ImageCaptioning => "Image Captioning",
            Self::EmbedText => "Embed Text",
            Self::AskAnything => "Ask me anything",
        }
    }

    /// 页面标题
    pub fn title(&self) -> &'static str {
        match self {
            Self::ChatBot => "🤖 ChatBot",
            Self::ImageCaptioning => "📷 Snap Narrate",
            Self::EmbedText => "🔡 Embed Text",
            Self::AskAnything => "❔ Ask me a question",
        }
    }

    /// 命令行里使用的短名
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::ChatBot => "chat",
            Self::ImageCaptioning => "caption",
            Self::EmbedText => "embed",
            Self::AskAnything => "ask",
        }
    }
}

impl fmt::Display for SelectedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SelectedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.short_name() == wanted || m.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown mode '{}', expected one of: chat, caption, embed, ask",
                    s.trim()
                )
            })
    }
}

/// 进程内会话状态
#[derive(Debug, Default)]
pub struct SessionState {
    selected_mode: SelectedMode,
    chat: Option<ChatSession>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_mode(&self) -> SelectedMode {
        self.selected_mode
    }

    pub fn set_selected_mode(&mut self, mode: SelectedMode) {
        if self.selected_mode != mode {
            info!("Mode changed: {} -> {}", self.selected_mode, mode);
        }
        self.selected_mode = mode;
    }

    /// 当前聊天会话（可能尚未创建）
    pub fn chat_session(&self) -> Option<&ChatSession> {
        self.chat.as_ref()
    }

    /// 获取当前聊天会话，不存在时用空历史创建
    pub fn get_or_create_chat_session(&mut self, model: &GenerativeModel) -> &mut ChatSession {
        self.chat.get_or_insert_with(|| model.start_chat(Vec::new()))
    }

    /// 丢弃当前会话并创建新的空会话
    pub fn reset_chat_session(&mut self, model: &GenerativeModel) -> &mut ChatSession {
        if let Some(old) = self.chat.as_ref() {
            info!("Chat session {} cleared ({} messages)", old.id(), old.len());
        }
        self.chat.insert(model.start_chat(Vec::new()))
    }
}
