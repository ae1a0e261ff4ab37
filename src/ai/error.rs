//! 模型 API 错误类型

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// 适配层对外暴露的错误
///
/// 适配层不做任何恢复或重试，所有失败原样交给调用方处理。
#[derive(Debug, Error)]
pub enum AiError {
    /// 网络错误、超时、服务端 5xx 或 408
    #[error("model API unavailable: {0}")]
    RemoteUnavailable(String),

    /// 服务端拒绝请求（参数错误、配额、密钥无效、内容被拦截等）
    #[error("model API rejected the request: {message}")]
    RemoteRejected {
        /// HTTP 状态码；内容拦截时为 None
        status: Option<u16>,
        message: String,
    },

    /// 本地无法解码图片，未发出任何远程请求
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// 输入文本为空，未发出任何远程请求
    #[error("input text is empty")]
    EmptyInput,

    /// 2xx 响应但内容不符合约定
    #[error("malformed response from model API: {0}")]
    MalformedResponse(String),
}

impl AiError {
    /// 根据非成功的 HTTP 状态和响应体构造错误
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body).unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.chars().take(500).collect()
            }
        });

        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            Self::RemoteUnavailable(format!("{}: {}", status, message))
        } else {
            Self::RemoteRejected {
                status: Some(status.as_u16()),
                message,
            }
        }
    }

    /// 从 `{"error": {"message": ...}}` 中取出错误描述
    fn extract_message(body: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ErrorBody,
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|e| e.error.message)
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if e.is_timeout() {
            Self::RemoteUnavailable(format!("request timed out: {}", e))
        } else {
            Self::RemoteUnavailable(e.to_string())
        }
    }
}
