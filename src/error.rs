//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义 `AppError` 枚举和 `AppResult` 类型别名。
//! 变体按处理方式划分：图片级（Extraction）只影响单张图片，
//! 查询级（Database）会中止整批匹配，行级提交失败由提交阶段自行记录。

use serde::Serialize;
use thiserror::Error;

/// 应用级统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 数据库错误（查询或更新失败）
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    /// 文件操作错误
    #[error("文件操作错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 验证错误（输入参数不合法）
    #[error("验证失败: {0}")]
    Validation(String),

    /// 选择的文件中含有不支持的类型，整批拒绝
    #[error("仅支持 JPEG 或 PNG 图片，以下文件被拒绝: {}", files.join(", "))]
    InputRejected { files: Vec<String> },

    /// 单张图片识别失败
    #[error("图片识别失败 ({file}): {message}")]
    Extraction { file: String, message: String },

    /// 资源未找到
    #[error("资源不存在: {entity} (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 批处理被操作员取消
    #[error("批处理已取消")]
    Cancelled,

    /// 业务逻辑错误
    #[error("{0}")]
    Business(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 是否属于存储层查询失败（会中止整批匹配）
    pub fn is_query_failure(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

// ========== From 实现：String 和 &str ==========

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Business(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Business(s.to_string())
    }
}

// ========== Serialize 实现：供展示层渲染 ==========

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AppError", 2)?;

        let error_type = match self {
            AppError::Database(_) => "database",
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
            AppError::Validation(_) => "validation",
            AppError::InputRejected { .. } => "input_rejected",
            AppError::Extraction { .. } => "extraction",
            AppError::NotFound { .. } => "not_found",
            AppError::Config(_) => "config",
            AppError::Cancelled => "cancelled",
            AppError::Business(_) => "business",
        };
        state.serialize_field("type", error_type)?;
        state.serialize_field("message", &self.to_string())?;

        state.end()
    }
}

/// 应用级 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

// ========== 扩展 trait：为 Result 添加上下文方法 ==========

/// 为 Result 类型添加错误上下文转换方法
pub trait ResultExt<T> {
    /// 将错误转换为验证错误
    fn validation_err(self, msg: &str) -> AppResult<T>;

    /// 将错误转换为配置错误
    fn config_err(self, msg: &str) -> AppResult<T>;

    /// 将错误转换为图片识别错误
    fn ocr_err(self, file: &str) -> AppResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn validation_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Validation(format!("{}: {}", msg, e)))
    }

    fn config_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Config(format!("{}: {}", msg, e)))
    }

    fn ocr_err(self, file: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Extraction {
            file: file.to_string(),
            message: e.to_string(),
        })
    }
}
