//! 配置管理模块
//!
//! 使用 TOML 文件存储配置，遵循 XDG 规范：
//! - Linux: ~/.config/playbot/config.toml
//! - macOS: ~/Library/Application Support/com.playbot.Playbot/config.toml
//! - Windows: %APPDATA%\playbot\Playbot\config\config.toml
//!
//! 环境变量 `GOOGLE_API_KEY` 会覆盖文件中的 `api.api_key`。

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// 重新导出 AI 相关配置
pub use crate::ai::embedding::EmbeddingConfig;
pub use crate::ai::gemini::ApiConfig;
pub use crate::ai::generative::ModelConfig;
pub use crate::ai::vision::ImageConfig;

/// API 密钥环境变量
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

fn default_chat_model() -> ModelConfig {
    ModelConfig::chat_default()
}

fn default_vision_model() -> ModelConfig {
    ModelConfig::vision_default()
}

/// 应用配置（顶层结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API 连接配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 聊天与问答模型
    #[serde(default = "default_chat_model")]
    pub chat: ModelConfig,
    /// 图片描述模型
    #[serde(default = "default_vision_model")]
    pub vision: ModelConfig,
    /// 文本嵌入配置
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// 图片预处理配置
    #[serde(default)]
    pub image: ImageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            chat: default_chat_model(),
            vision: default_vision_model(),
            embedding: EmbeddingConfig::default(),
            image: ImageConfig::default(),
        }
    }
}

impl AppConfig {
    /// 获取配置目录路径
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "playbot", "Playbot") {
            Ok(proj_dirs.config_dir().to_path_buf())
        } else {
            // 回退到 ~/.playbot
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
            Ok(home.join(".playbot"))
        }
    }

    /// 获取配置文件完整路径
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// 从默认位置加载配置
    ///
    /// 如果文件不存在，返回默认配置并创建文件
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 从指定文件加载配置
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {}", path.display());

        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content).map_err(|e| {
                warn!("Failed to parse config file: {}", e);
                e
            })?;
            info!("Config loaded from: {}", path.display());
            Ok(config)
        } else {
            info!("Config file not found, creating default at: {}", path.display());
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// 保存配置到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path.parent().ok_or_else(|| anyhow!("Invalid config path"))?;

        // 确保目录存在
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!("Created config directory: {}", dir.display());
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, &content)?;

        // 文件里可能有 API 密钥，仅用户可读写
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {}", API_KEY_ENV);
            self.api.api_key = Some(key.trim().to_string());
        }
        self
    }
}
