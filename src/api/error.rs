// ==========================================
// 地磅称重系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，转换为面向操作员的提示
// 红线: 被拒绝的操作不改变任何状态，错误信息必须说明原因
// ==========================================

use crate::engine::error::WeighingError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::scale::error::ScaleError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务校验错误（直接展示给操作员，已本地化）
    // ==========================================
    #[error("{0}")]
    UserError(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::StaleState { .. } => WeighingError::Stale.into(),
        }
    }
}

// ==========================================
// 从 WeighingError 转换（本地化提示）
// ==========================================
impl From<WeighingError> for ApiError {
    fn from(err: WeighingError) -> Self {
        ApiError::UserError(err.user_message())
    }
}

// 仪表读数失败: "Error: <原因>"，不改变称重状态
impl From<ScaleError> for ApiError {
    fn from(err: ScaleError) -> Self {
        WeighingError::ScaleReadFailed {
            reason: err.to_string(),
        }
        .into()
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(repo_err) => repo_err.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
