//! 模型后端抽象
//!
//! 适配层的所有远程调用都经过 [`ModelBackend`]，生产环境使用
//! [`GeminiClient`](super::gemini::GeminiClient)，测试中替换为脚本化的实现。

use async_trait::async_trait;

use super::error::AiError;
use super::protocol::{
    EmbedContentRequest, EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
};

/// 外部生成式 API
///
/// 每次调用对应一次远程请求，实现方不得重试或缓存。
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// 内容生成（聊天、问答、图片描述共用）
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError>;

    /// 文本嵌入
    async fn embed_content(
        &self,
        model: &str,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, AiError>;

    /// 后端名称（用于日志和状态展示）
    fn backend_name(&self) -> String;
}
