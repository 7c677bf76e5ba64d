// ==========================================
// 批量导入引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把仓储/导入错误转换为调用方可读的消息
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用方输入 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 运行配置、映射或已保存方案不可用
    #[error("配置错误: {0}")]
    ConfigError(String),

    // ===== 存储 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ===== 导入 =====
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            e @ RepositoryError::LockError(_) => ApiError::DatabaseConnectionError(e.to_string()),
            e @ (RepositoryError::DatabaseQueryError(_)
            | RepositoryError::UniqueConstraintViolation(_)
            | RepositoryError::ForeignKeyViolation(_)
            | RepositoryError::RowNotFound) => ApiError::DatabaseError(e.to_string()),
            e @ (RepositoryError::NonConcreteResourceType(_)
            | RepositoryError::MissingIngester) => ApiError::ValidationError(e.to_string()),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            e @ RepositoryError::ProfileCodecError(_) => ApiError::ConfigError(e.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            ImportError::UnsupportedFormat(ext) => {
                ApiError::InvalidInput(format!("不支持的文件格式: {}", ext))
            }
            e @ (ImportError::ConfigReadError { .. } | ImportError::ConfigValueError { .. }) => {
                ApiError::ConfigError(e.to_string())
            }
            ImportError::Repository(e) => ApiError::from(e),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::ConfigValueError {
            key: "owner".to_string(),
            value: "current".to_string(),
            message: "未提供当前用户 id".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::ConfigError(_)));

        let err: ApiError = ImportError::Repository(RepositoryError::LockError("poisoned".to_string())).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));

        let err: ApiError = ImportError::CsvParseError("bad quote".to_string()).into();
        assert!(matches!(err, ApiError::ImportError(_)));

        let err: ApiError = RepositoryError::MissingIngester.into();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(err.to_string().contains("ingester"));
    }
}
