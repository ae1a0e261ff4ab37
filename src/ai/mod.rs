//! 模型客户端适配层
//!
//! 把本地请求转换为 Gemini API 调用，并把响应转换回本地类型。
//! 包含聊天会话、单轮问答、图片描述和文本嵌入。不做重试、缓存或批处理。

pub mod backend;
pub mod chat;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod generative;
pub mod protocol;
pub mod vision;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::ModelBackend;
pub use chat::{ChatMessage, ChatSession, Role, SessionId};
pub use embedding::{EmbeddingConfig, EmbeddingVector, TextEmbedder};
pub use error::AiError;
pub use gemini::{ApiConfig, GeminiClient};
pub use generative::{GenerativeModel, ModelConfig};
pub use protocol::TaskType;
pub use vision::{CaptionRequest, ImageConfig, VisionModel, DEFAULT_CAPTION_PROMPT};
