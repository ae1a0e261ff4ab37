//! 测试用脚本化后端

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use super::backend::ModelBackend;
use super::chat::Role;
use super::error::AiError;
use super::protocol::{
    Candidate, Content, ContentEmbedding, EmbedContentRequest, EmbedContentResponse,
    GenerateContentRequest, GenerateContentResponse,
};

/// 按顺序返回预设结果并记录收到的请求；脚本耗尽时返回 `RemoteUnavailable`
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<GenerateContentResponse, AiError>>>,
    embeddings: Mutex<VecDeque<Result<EmbedContentResponse, AiError>>>,
    generate_requests: Mutex<Vec<(String, GenerateContentRequest)>>,
    embed_requests: Mutex<Vec<(String, EmbedContentRequest)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content::text(Role::Model, text)),
                finish_reason: Some("STOP".to_string()),
            }],
            ..Default::default()
        };
        self.replies.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: AiError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn push_embedding(&self, values: Vec<f32>) {
        let response = EmbedContentResponse {
            embedding: ContentEmbedding { values },
        };
        self.embeddings.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_embedding_error(&self, error: AiError) {
        self.embeddings.lock().unwrap().push_back(Err(error));
    }

    pub fn generate_count(&self) -> usize {
        self.generate_requests.lock().unwrap().len()
    }

    pub fn embed_count(&self) -> usize {
        self.embed_requests.lock().unwrap().len()
    }

    pub fn last_generate_request(&self) -> Option<(String, GenerateContentRequest)> {
        self.generate_requests.lock().unwrap().last().cloned()
    }

    pub fn last_embed_request(&self) -> Option<(String, EmbedContentRequest)> {
        self.embed_requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        self.generate_requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::RemoteUnavailable("no scripted reply".into())))
    }

    async fn embed_content(
        &self,
        model: &str,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, AiError> {
        self.embed_requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        self.embeddings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::RemoteUnavailable("no scripted embedding".into())))
    }

    fn backend_name(&self) -> String {
        "Scripted".to_string()
    }
}

/// 生成一张纯色 PNG
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
