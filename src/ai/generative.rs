//! 生成式模型
//!
//! 对应一个具体模型（如 gemini-2.0-flash）及其生成参数，
//! 提供单轮文本补全和聊天会话创建。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::backend::ModelBackend;
use super::chat::{ChatMessage, ChatSession, Role};
use super::error::AiError;
use super::protocol::{Content, GenerateContentRequest, GenerationConfig};

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 模型名称（如 gemini-2.0-flash）
    pub model: String,
    /// 温度参数，不设置则使用服务端默认值
    #[serde(default)]
    pub temperature: Option<f32>,
    /// 最大输出 tokens，不设置则使用服务端默认值
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl ModelConfig {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// 聊天 / 问答默认模型
    pub fn chat_default() -> Self {
        Self::new("gemini-2.0-flash")
    }

    /// 图片描述默认模型
    pub fn vision_default() -> Self {
        Self {
            max_output_tokens: Some(256),
            ..Self::new("gemini-2.0-flash")
        }
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// 生成式模型句柄，克隆开销很小
#[derive(Clone)]
pub struct GenerativeModel {
    backend: Arc<dyn ModelBackend>,
    config: ModelConfig,
}

impl fmt::Debug for GenerativeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeModel")
            .field("backend", &self.backend.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl GenerativeModel {
    pub fn new(backend: Arc<dyn ModelBackend>, config: ModelConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 创建聊天会话，history 可以为空
    pub fn start_chat(&self, history: Vec<ChatMessage>) -> ChatSession {
        ChatSession::new(self.clone(), history)
    }

    /// 单轮文本补全，不涉及任何会话状态
    pub async fn complete_text(&self, prompt: &str) -> Result<String, AiError> {
        if prompt.trim().is_empty() {
            return Err(AiError::EmptyInput);
        }

        self.generate(vec![Content::text(Role::User, prompt)]).await
    }

    /// 发送一次 generateContent 请求并取出回复文本
    pub(crate) async fn generate(&self, contents: Vec<Content>) -> Result<String, AiError> {
        let request = GenerateContentRequest::new(contents, self.config.generation_config());

        let response = self
            .backend
            .generate_content(&self.config.model, &request)
            .await?;

        let text = response.into_text()?;
        debug!("{} replied with {} chars", self.config.model, text.chars().count());

        Ok(text)
    }
}
