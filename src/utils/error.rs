// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏，按错误来源划分变体
// ============================================================================

use thiserror::Error;

/// 应用统一错误枚举
///
/// 三类错误对应三种呈现方式：
/// - 校验错误：网络请求前同步抛出，由调用方以阻塞提示展示
/// - 网络/HTTP 错误：按列表记录为行内提示
/// - 变更错误：保存/删除失败，弹窗保持打开以便重试
#[derive(Debug, Error)]
pub enum AppError {
    /// 表单校验失败（如未填写编码、未选择产品）
    #[error("{0}")]
    ValidationError(String),

    /// 后端返回非 2xx 状态码，不解析响应体
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// 请求未能完成（连接失败、超时、响应解析失败）
    #[error("网络请求失败：{0}")]
    NetworkError(String),

    /// 本地设置库错误
    #[error("{0}")]
    DatabaseError(String),

    /// 配置文件读取或解析失败
    #[error("配置加载失败：{0}")]
    ConfigError(String),

    /// 模块父级链路存在循环或超出深度上限
    #[error("模块层级存在循环或超出深度上限（模块 ID: {module_id}）")]
    CycleDetected { module_id: i64 },

    /// 排序持久化最终失败，本地顺序已回滚
    #[error("排序保存失败，已恢复原顺序：{0}")]
    ReorderReverted(String),

    /// 已有提交在进行中
    #[error("操作进行中，请稍候")]
    Busy,

    /// 目标记录不存在
    #[error("{0}不存在")]
    NotFound(String),
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

/// 将 AppError 转换为 String，供界面层直接展示
impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::HttpStatus {
                status: status.as_u16(),
            },
            None => AppError::NetworkError(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::DatabaseError(format!("设置存储失败：{}", err))
    }
}

impl AppError {
    /// 快捷构造校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError(message.into())
    }
}
