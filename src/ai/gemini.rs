//! Gemini REST 客户端
//!
//! 通过 `generativelanguage.googleapis.com` 的 v1beta 接口调用 Gemini 模型。
//! 单次请求，无重试；超时由配置决定。

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::backend::ModelBackend;
use super::error::AiError;
use super::protocol::{
    EmbedContentRequest, EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
};

/// 默认 API 端点
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// API 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 端点（如 https://generativelanguage.googleapis.com/v1beta）
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API 密钥
    #[serde(default)]
    pub api_key: Option<String>,
    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// 创建自定义端点配置（代理或测试服务器）
    pub fn custom(endpoint: &str, api_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    /// 是否配置了非空密钥
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false)
    }
}

/// Gemini API 客户端
pub struct GeminiClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// 创建新的客户端
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Gemini client created");
        info!("  Endpoint: {}", config.endpoint);
        info!("  Timeout: {}s", config.timeout_secs);

        Ok(Self { config, client })
    }

    /// 拼接方法 URL：`{endpoint}/models/{model}:{method}`
    fn method_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.endpoint.trim_end_matches('/'),
            model.trim_start_matches("models/"),
            method
        )
    }

    /// 发送 POST 请求并解析 JSON 响应
    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, AiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("Gemini API URL: {}", url);

        let start_time = Instant::now();

        let mut req = self.client.post(url).json(body);

        if let Some(ref key) = self.config.api_key {
            req = req.header("x-goog-api-key", key);
            debug!(
                "Gemini API: Using API key ({}...)",
                key.chars().take(8).collect::<String>()
            );
        }

        let response = req.send().await?;
        let status = response.status();

        info!(
            "Gemini API Response: status={}, elapsed={:.2}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            warn!("Gemini API Error: status={}, body={}", status, error);
            return Err(AiError::from_status(status, &error));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        info!(
            "Gemini generateContent: model={}, turns={}",
            model,
            request.contents.len()
        );

        let url = self.method_url(model, "generateContent");
        let response: GenerateContentResponse = self.post(&url, request).await?;

        if let Some(ref usage) = response.usage_metadata {
            info!(
                "Gemini API Usage: prompt_tokens={}, completion_tokens={}, total_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(response)
    }

    async fn embed_content(
        &self,
        model: &str,
        request: &EmbedContentRequest,
    ) -> Result<EmbedContentResponse, AiError> {
        info!(
            "Gemini embedContent: model={}, task_type={:?}",
            model, request.task_type
        );

        let url = self.method_url(model, "embedContent");
        let response: EmbedContentResponse = self.post(&url, request).await?;

        debug!("Embedded text into {} dimensions", response.embedding.values.len());
        Ok(response)
    }

    fn backend_name(&self) -> String {
        if self.config.endpoint.contains("generativelanguage.googleapis.com") {
            "Gemini".to_string()
        } else {
            format!("Custom ({})", self.config.endpoint)
        }
    }
}
