// ==========================================
// 批量导入引擎 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 存储失败（连接/锁/查询/约束）与写入前校验失败
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 存储失败 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    /// 常见于 owner / template / class / 关系目标指向不存在的行
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("查询无结果")]
    RowNotFound,

    // ===== 写入前校验 =====
    #[error("无法写入非具体资源类型: {0}")]
    NonConcreteResourceType(String),

    #[error("媒体缺少 ingester")]
    MissingIngester,

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 已保存的导入方案无法编解码
    #[error("导入方案编解码失败: {0}")]
    ProfileCodecError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::CannotOpen =>
            {
                RepositoryError::DatabaseConnectionError(code.to_string())
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::RowNotFound,
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::ProfileCodecError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
