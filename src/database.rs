// ============================================================================
// 数据库模块：本地设置存储（SQLite）
// 使用 rusqlite 直接操作 SQLite，遵循 KISS 原则，不引入 ORM
// 只保存客户端本地状态：应用名称、应用图标
// ============================================================================

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::error::{AppError, AppResult};

/// 数据库文件名
pub const DB_FILE_NAME: &str = "rd_console.db";

/// 应用名称设置键
pub const APP_NAME_KEY: &str = "rd_app_name";
/// 应用图标（data URL）设置键
pub const APP_ICON_KEY: &str = "rd_app_icon";

/// 未设置时的应用名称
pub const DEFAULT_APP_NAME: &str = "研发管理系统";

// ============================================================================
// 数据结构定义
// ============================================================================

/// 应用设置
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub app_name: String,
    /// 图片 data URL，未设置为 None
    pub app_icon: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_icon: None,
        }
    }
}

// ============================================================================
// 数据库管理器
// ============================================================================

/// 数据库管理器，封装 rusqlite 连接
pub struct Database {
    /// SQLite 数据库连接
    conn: Connection,
}

impl Database {
    /// 初始化数据库：在指定目录创建数据库文件并建表
    ///
    /// # 参数
    /// - `data_dir`: 本地数据目录（配置项 `data_dir`）
    ///
    /// # 返回
    /// - `Ok(Database)`: 初始化成功
    /// - `Err(AppError::DatabaseError)`: 目录或文件无法创建
    pub fn init(data_dir: &Path) -> AppResult<Self> {
        // 确保数据目录存在
        std::fs::create_dir_all(data_dir).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法创建数据目录 {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法打开数据库文件 {}: {}",
                db_path.display(),
                e
            ))
        })?;

        Self::create_tables(&conn)?;
        log::info!("本地设置库已就绪：{}", db_path.display());

        Ok(Database { conn })
    }

    /// 内存库，供测试和无数据目录场景使用
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_tables(&conn)?;
        Ok(Database { conn })
    }

    fn create_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            "
            -- 设置表（键值对）
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| {
            AppError::DatabaseError(format!("数据库初始化失败：创建表结构时出错: {}", e))
        })?;

        Ok(())
    }

    /// 获取数据库连接的引用
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // 设置方法（键值对操作）
    // ========================================================================

    /// 读取单个设置项，键不存在返回 None
    pub fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 保存单个设置项
    ///
    /// 使用 INSERT OR REPLACE 实现 upsert 语义：
    /// - 如果键不存在，插入新记录
    /// - 如果键已存在，更新其值
    pub fn save_setting(&self, key: &str, value: &str) -> AppResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// 删除单个设置项，键不存在时无操作
    pub fn remove_setting(&self, key: &str) -> AppResult<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// 获取应用设置，未保存的项取默认值
    pub fn get_app_settings(&self) -> AppResult<AppSettings> {
        let app_name = self
            .get_setting(APP_NAME_KEY)?
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let app_icon = self.get_setting(APP_ICON_KEY)?;
        Ok(AppSettings { app_name, app_icon })
    }
}

// ============================================================================
// 单元测试
// ============================================================================
