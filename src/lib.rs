//! Playbot - Play With Chat Bot
//!
//! 核心库，提供 Gemini 模型适配层（聊天、问答、图片描述、文本嵌入）、
//! 进程内会话状态和界面事件分发。

pub mod ai;
pub mod commands;
pub mod config;
pub mod session;

use std::sync::Arc;
use tracing::info;

pub use ai::{AiError, ChatMessage, ChatSession, EmbeddingVector, GeminiClient, ModelBackend};
pub use commands::{dispatch, Event, Reply};
pub use config::AppConfig;
pub use session::{SelectedMode, SessionState};

/// 应用状态
///
/// 由事件循环独占，每个事件以 `&mut` 传入分发层。
#[derive(Debug)]
pub struct AppState {
    /// 应用配置（TOML 文件）
    pub config: AppConfig,
    /// 聊天与问答模型
    pub chat_model: ai::GenerativeModel,
    /// 图片描述模型
    pub vision: ai::VisionModel,
    /// 文本嵌入器
    pub embedder: ai::TextEmbedder,
    /// 当前模式与聊天会话
    pub session: SessionState,
}

impl AppState {
    /// 使用 Gemini 客户端创建应用状态
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(GeminiClient::new(config.api.clone())?);
        Ok(Self::with_backend(config, backend))
    }

    /// 使用指定后端创建应用状态
    pub fn with_backend(config: AppConfig, backend: Arc<dyn ModelBackend>) -> Self {
        info!("Model backend: {}", backend.backend_name());
        info!("  Chat model: {}", config.chat.model);
        info!("  Vision model: {}", config.vision.model);

        let chat_model = ai::GenerativeModel::new(backend.clone(), config.chat.clone());
        let vision = ai::VisionModel::new(
            ai::GenerativeModel::new(backend.clone(), config.vision.clone()),
            config.image.clone(),
        );
        let embedder = ai::TextEmbedder::new(backend, config.embedding.clone());
        info!("  Embedder: {}", embedder.backend_name());

        Self {
            config,
            chat_model,
            vision,
            embedder,
            session: SessionState::new(),
        }
    }
}
