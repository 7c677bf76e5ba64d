// ==========================================
// 批量导入引擎 - 标识符查询 Repository Trait
// ==========================================
// 职责: 为标识符解析提供候选行（不含平局裁决规则）
// 红线: Repository 不含业务规则，只做数据查询
// ==========================================

use crate::domain::identifier::IdentifierMatch;
use crate::domain::types::ResourceType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// IdentifierRepository Trait
// ==========================================
// 用途: 标识符解析的存储后端
// 实现者: IdentifierRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait IdentifierRepository: Send + Sync {
    /// 查询实际存在的资源 id
    ///
    /// # 参数
    /// - ids: 候选资源 id
    /// - resource_type: 资源类型过滤（None 表示不过滤）
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 存在的 id（升序）
    async fn find_existing_ids(
        &self,
        ids: &[i64],
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Vec<i64>>;

    /// 查询属性值匹配（大小写不敏感匹配，调用方负责区分大小写优先）
    ///
    /// # 参数
    /// - property_id: 属性 id
    /// - values: 待匹配的值
    /// - resource_type: 资源类型过滤
    ///
    /// # 返回
    /// - Ok(Vec<IdentifierMatch>): 按 (resource_id, row_id) 升序
    async fn find_property_values(
        &self,
        property_id: i64,
        values: &[String],
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Vec<IdentifierMatch>>;

    /// 查询媒体来源匹配
    ///
    /// # 参数
    /// - ingester: 媒体 ingester 名称（url / file ...）
    /// - sources: 待匹配的来源
    /// - item_id: 父条目范围（None 表示不限）
    ///
    /// # 返回
    /// - Ok(Vec<IdentifierMatch>): 按媒体 id 升序
    async fn find_media_sources(
        &self,
        ingester: &str,
        sources: &[String],
        item_id: Option<i64>,
    ) -> RepositoryResult<Vec<IdentifierMatch>>;
}
