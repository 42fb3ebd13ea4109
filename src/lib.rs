// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块、把配置/客户端/设置库装配成 Console
// ⛔ 禁止：直接实现页面逻辑
// ============================================================================

pub mod commands;
pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use commands::Console;
use config::ConsoleConfig;
use database::Database;
use services::api_client::ApiClient;
use utils::error::AppResult;

// ============================================================================
// 应用入口
// ============================================================================

/// 按配置创建 REST 客户端、打开本地设置库，组装控制台
///
/// 日志由宿主程序初始化。
pub fn bootstrap(config: ConsoleConfig) -> AppResult<Console<ApiClient>> {
    let api = Arc::new(ApiClient::new(&config.api_base_url, config.request_timeout()));
    let db = Database::init(&config.data_dir)?;
    log::info!("控制台已初始化，后端地址：{}", api.base_url());
    Console::new(api, config, db)
}

/// 从配置文件启动；文件不存在时使用默认配置
pub fn bootstrap_from_file(path: &Path) -> AppResult<Console<ApiClient>> {
    bootstrap(ConsoleConfig::load(path)?)
}
