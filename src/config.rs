// ============================================================================
// 配置：TOML 文件 + serde 默认值
// ============================================================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::paginator::PAGE_SIZE_OPTIONS;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConsoleConfig {
    /// 后端地址（如 "http://127.0.0.1:8080"）
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 列表默认每页条数，须为 10/20/50 之一
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// 菜单保存防抖窗口（毫秒）
    #[serde(default = "default_menu_save_debounce_ms")]
    pub menu_save_debounce_ms: u64,
    /// 本地设置库目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// 字典排序持久化的重试策略
    #[serde(default)]
    pub reorder: ReorderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReorderConfig {
    /// 含首次在内的最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 首次重试前的等待（毫秒），之后每次翻倍
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl ReorderConfig {
    /// 第 attempt 次失败后的等待时间（attempt 从 1 开始）
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    PAGE_SIZE_OPTIONS[0]
}

fn default_menu_save_debounce_ms() -> u64 {
    300
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_page_size: default_page_size(),
            menu_save_debounce_ms: default_menu_save_debounce_ms(),
            data_dir: default_data_dir(),
            reorder: ReorderConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// 从 TOML 文件加载；文件不存在时使用默认配置
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::info!("配置文件 {} 不存在，使用默认配置", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AppResult<Self> {
        let config: ConsoleConfig =
            toml::from_str(content).map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if !PAGE_SIZE_OPTIONS.contains(&self.default_page_size) {
            return Err(AppError::ConfigError(format!(
                "default_page_size 必须为 {:?} 之一，当前为 {}",
                PAGE_SIZE_OPTIONS, self.default_page_size
            )));
        }
        if self.reorder.max_attempts == 0 {
            return Err(AppError::ConfigError("reorder.max_attempts 至少为 1".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn menu_save_debounce(&self) -> Duration {
        Duration::from_millis(self.menu_save_debounce_ms)
    }
}
