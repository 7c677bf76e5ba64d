// ==========================================
// 批量导入引擎 - 资源写入 Repository Trait
// ==========================================
// 职责: 批量写入端（单条创建 / 批量创建）
// 红线: Repository 不含业务规则，只做数据写入
// ==========================================

use crate::domain::resource::{CreatedResource, ResourcePayload};
use crate::domain::types::ResourceType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 批量创建选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCreateOptions {
    /// 单条失败时继续处理剩余载荷
    pub continue_on_error: bool,
}

impl Default for BatchCreateOptions {
    fn default() -> Self {
        Self {
            continue_on_error: true,
        }
    }
}

// ==========================================
// ResourceWriteRepository Trait
// ==========================================
// 用途: 导入管道的写入端
// 实现者: ResourceWriteRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ResourceWriteRepository: Send + Sync {
    /// 创建单个资源
    ///
    /// # 返回
    /// - Ok(CreatedResource): 已创建资源
    /// - Err: 写入失败（事务回滚）
    async fn create_one(
        &self,
        resource_type: ResourceType,
        payload: ResourcePayload,
    ) -> RepositoryResult<CreatedResource>;

    /// 批量创建资源
    ///
    /// # 说明
    /// - continue_on_error = true: 单条失败只跳过该条，返回实际创建的资源
    /// - continue_on_error = false: 任一失败整体回滚并返回 Err
    async fn create_many(
        &self,
        resource_type: ResourceType,
        payloads: Vec<ResourcePayload>,
        options: BatchCreateOptions,
    ) -> RepositoryResult<Vec<CreatedResource>>;

    /// 统计资源数量（None 表示全部类型）
    async fn count_resources(&self, resource_type: Option<ResourceType>) -> RepositoryResult<usize>;
}
