//! 文本嵌入模块
//!
//! 通过 Gemini `embedContent` 把单条文本转换为向量。
//! 每次调用对应一次远程请求，不做批处理或缓存。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::backend::ModelBackend;
use super::error::AiError;
use super::protocol::{qualified_model_name, Content, EmbedContentRequest, Part, TaskType};

/// 嵌入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,
    /// 任务类型
    #[serde(default)]
    pub task_type: TaskType,
}

fn default_model() -> String {
    "text-embedding-004".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            task_type: TaskType::default(),
        }
    }
}

/// 嵌入向量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl fmt::Display for EmbeddingVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// 文本嵌入器
#[derive(Clone)]
pub struct TextEmbedder {
    backend: Arc<dyn ModelBackend>,
    config: EmbeddingConfig,
}

impl fmt::Debug for TextEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEmbedder")
            .field("backend", &self.backend.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl TextEmbedder {
    pub fn new(backend: Arc<dyn ModelBackend>, config: EmbeddingConfig) -> Self {
        Self { backend, config }
    }

    /// 获取后端名称
    pub fn backend_name(&self) -> String {
        format!("{} ({})", self.backend.backend_name(), self.config.model)
    }

    /// 嵌入单个文本
    ///
    /// 空文本（含纯空白）直接返回 [`AiError::EmptyInput`]。
    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector, AiError> {
        if text.trim().is_empty() {
            return Err(AiError::EmptyInput);
        }

        let request = EmbedContentRequest {
            model: qualified_model_name(&self.config.model),
            content: Content {
                role: None,
                parts: vec![Part::text(text)],
            },
            task_type: Some(self.config.task_type),
        };

        info!(
            "Embedding request: model={}, text_len={}",
            self.config.model,
            text.chars().count()
        );

        let response = self
            .backend
            .embed_content(&self.config.model, &request)
            .await?;

        let values = response.embedding.values;
        if values.is_empty() {
            return Err(AiError::MalformedResponse(
                "embedding contains no values".into(),
            ));
        }

        debug!("Embedding returned {} dimensions", values.len());
        Ok(EmbeddingVector(values))
    }
}
