// ==========================================
// 批量导入引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 标识符查询、元数据查询、资源写入，屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod identifier_repo;
pub mod identifier_repo_impl;
pub mod metadata_repo;
pub mod metadata_repo_impl;
pub mod resource_repo;
pub mod resource_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use identifier_repo::IdentifierRepository;
pub use identifier_repo_impl::IdentifierRepositoryImpl;
pub use metadata_repo::{detect_field_metadata, MetadataRepository};
pub use metadata_repo_impl::MetadataRepositoryImpl;
pub use resource_repo::{BatchCreateOptions, ResourceWriteRepository};
pub use resource_repo_impl::ResourceWriteRepositoryImpl;
