//! 图片描述模块
//!
//! 图片先在本地解码、缩放并重新编码为 JPEG，再以内联数据的形式
//! 连同提示词一起发送给多模态模型。无法解码的输入不会产生远程请求。

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, info, warn};

use super::error::AiError;
use super::generative::GenerativeModel;
use super::protocol::{Content, Part};

/// 默认图片描述提示词
pub const DEFAULT_CAPTION_PROMPT: &str = "write a short caption for this image";

/// 图片预处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// 发送前的最大宽度（像素）
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// 发送前的最大高度（像素）
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// 默认提示词
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
}

fn default_max_width() -> u32 {
    1280
}

fn default_max_height() -> u32 {
    720
}

fn default_prompt() -> String {
    DEFAULT_CAPTION_PROMPT.to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            default_prompt: default_prompt(),
        }
    }
}

/// 图片描述请求
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    /// 原始图片字节（PNG / JPEG / WebP）
    pub image: Vec<u8>,
    /// 为空时使用 [`ImageConfig::default_prompt`]
    pub prompt: String,
}

impl CaptionRequest {
    /// 不带提示词，发送时使用配置中的默认提示词
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            prompt: String::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = prompt.to_string();
        self
    }
}

/// 多模态图片描述模型
#[derive(Debug, Clone)]
pub struct VisionModel {
    model: GenerativeModel,
    image: ImageConfig,
}

impl VisionModel {
    pub fn new(model: GenerativeModel, image: ImageConfig) -> Self {
        Self { model, image }
    }

    /// 为图片生成简短描述
    ///
    /// 提示词为空时使用配置中的默认提示词。
    pub async fn caption_image(&self, prompt: &str, image: &[u8]) -> Result<String, AiError> {
        let image_base64 = self.encode_image(image)?;

        let prompt = if prompt.trim().is_empty() {
            self.image.default_prompt.as_str()
        } else {
            prompt
        };

        info!(
            "Caption request: model={}, prompt_len={}, image_size={}KB",
            self.model.config().model,
            prompt.chars().count(),
            image_base64.len() / 1024
        );

        let contents = vec![Content::user(vec![
            Part::text(prompt),
            Part::jpeg(image_base64),
        ])];

        self.model.generate(contents).await
    }

    /// 执行 [`CaptionRequest`]
    pub async fn caption(&self, request: &CaptionRequest) -> Result<String, AiError> {
        self.caption_image(&request.prompt, &request.image).await
    }

    /// 解码原始字节并编码为 base64 JPEG
    fn encode_image(&self, bytes: &[u8]) -> Result<String, AiError> {
        let image = image::load_from_memory(bytes).map_err(|e| {
            warn!("Failed to decode image ({} bytes): {}", bytes.len(), e);
            AiError::UnsupportedImageFormat(e.to_string())
        })?;

        let image = self.fit_within_bounds(image);

        // JPEG 不支持透明通道
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, image::ImageFormat::Jpeg)
            .map_err(|e| AiError::UnsupportedImageFormat(e.to_string()))?;

        Ok(BASE64.encode(buffer.into_inner()))
    }

    /// 缩放大图（保持宽高比）
    fn fit_within_bounds(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        if width <= self.image.max_width && height <= self.image.max_height {
            return image;
        }

        let resized = image.resize(self.image.max_width, self.image.max_height, FilterType::Triangle);
        debug!(
            "Image resized: {}x{} -> {}x{}",
            width,
            height,
            resized.width(),
            resized.height()
        );
        resized
    }
}
