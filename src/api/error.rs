// ==========================================
// 志愿者排班系统 - API 层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("记录未找到: {0}")]
    NotFound(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("引擎执行失败: {0}")]
    EngineError(String),

    #[error("参数错误: {0}")]
    InvalidParameter(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg)
            | RepositoryError::FieldValueError { message: msg, .. } => {
                ApiError::InvalidParameter(msg)
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error>> for ApiError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        // 引擎层以 Box<dyn Error> 传播，仓储错误在此还原分类
        match err.downcast::<RepositoryError>() {
            Ok(repo_err) => ApiError::from(*repo_err),
            Err(other) => ApiError::EngineError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
