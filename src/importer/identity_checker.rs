// ==========================================
// 批量导入引擎 - 标识符唯一性检查
// ==========================================
// 职责: 草稿 → 是否可入批
// 规则:
// 1) 草稿尚无资源 id → 按标识符名称优先级依次解析草稿自身的标识符值，
//    第一个解析到 id 的种类即停止
// 2) 解析到的 id 视为已存在的重复资源（不是更新目标）
// 3) 有 id → allow: 警告后放行（仍创建新资源）；reject: 记错误并排除
// 4) 返回值 = 草稿没有错误标记
// 检查与写入之间不加锁，并发运行可能产生重复资源
// ==========================================

use crate::domain::identifier::{IdentifierKind, IdentifierQuery};
use crate::domain::resource::{ResourceDraft, ValueContent};
use crate::domain::types::DuplicatePolicy;
use crate::engine::identifier_resolver::{IdentifierResolver, NormalizedIdentifier};
use crate::importer::error::ImportResult;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct IdentityChecker {
    resolver: Arc<IdentifierResolver>,
    identifiers: Vec<NormalizedIdentifier>,
    policy: DuplicatePolicy,
}

impl IdentityChecker {
    pub fn new(
        resolver: Arc<IdentifierResolver>,
        identifiers: Vec<NormalizedIdentifier>,
        policy: DuplicatePolicy,
    ) -> Self {
        Self {
            resolver,
            identifiers,
            policy,
        }
    }

    /// 检查草稿
    ///
    /// # 返回
    /// - Ok(true): 可入批
    /// - Ok(false): 草稿带错误标记
    /// - Err: 存储层失败
    pub async fn check(&self, draft: &mut ResourceDraft, index: usize) -> ImportResult<bool> {
        if draft.has_error {
            return Ok(false);
        }

        self.check_id(draft).await?;
        if draft.resource_id.is_none() {
            self.fill_id(draft).await?;
        }

        if let Some(resource_id) = draft.resource_id {
            match self.policy {
                DuplicatePolicy::Allow => {
                    warn!(
                        index = index,
                        resource_type = %draft.resource_type,
                        resource_id = resource_id,
                        "标识符与已有资源重复，按配置继续创建新资源"
                    );
                }
                DuplicatePolicy::Reject => {
                    error!(
                        index = index,
                        resource_type = %draft.resource_type,
                        resource_id = resource_id,
                        "标识符与已有资源重复，条目跳过"
                    );
                    draft.has_error = true;
                }
            }
        }

        Ok(!draft.has_error)
    }

    /// 已设置但未校验的资源 id：按运行资源类型确认存在，否则清除
    async fn check_id(&self, draft: &mut ResourceDraft) -> ImportResult<()> {
        let Some(resource_id) = draft.resource_id else {
            return Ok(());
        };
        if draft.id_checked {
            return Ok(());
        }

        let found = self
            .resolver
            .resolve_one(
                &resource_id.to_string(),
                IdentifierKind::InternalId,
                Some(draft.resource_type),
            )
            .await?;
        draft.resource_id = found;
        draft.id_checked = found.is_some();
        Ok(())
    }

    /// 按标识符名称优先级查找已存在的资源
    async fn fill_id(&self, draft: &mut ResourceDraft) -> ImportResult<()> {
        for identifier in &self.identifiers {
            let values = draft_identifier_values(draft, &identifier.kind);
            if values.is_empty() {
                continue;
            }

            let query = IdentifierQuery::new(
                values,
                identifier.kind.clone(),
                Some(draft.resource_type),
            );
            let resolution = self.resolver.resolve(&query).await?;
            if let Some(id) = resolution.first_resolved() {
                debug!(identifier = %identifier.label, resource_id = id, "标识符匹配到已有资源");
                draft.resource_id = Some(id);
                draft.id_checked = true;
                break;
            }
        }
        Ok(())
    }
}

/// 草稿中对应标识符种类的值
fn draft_identifier_values(draft: &ResourceDraft, kind: &IdentifierKind) -> Vec<String> {
    match kind {
        // 内部 id 由构建器直接写入 resource_id
        IdentifierKind::InternalId => Vec::new(),
        IdentifierKind::Property(property_id) => draft
            .values_of(*property_id)
            .filter_map(|v| match &v.content {
                ValueContent::Literal { value } => Some(value.clone()),
                ValueContent::Uri { uri, .. } => Some(uri.clone()),
                ValueContent::Resource { .. } => None,
            })
            .collect(),
        IdentifierKind::MediaSource { ingester, .. } => {
            match (&draft.ingester, &draft.source) {
                (Some(draft_ingester), Some(source)) if draft_ingester == ingester => {
                    vec![source.clone()]
                }
                _ => Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifier::IdentifierMatch;
    use crate::domain::resource::PropertyValue;
    use crate::domain::types::ResourceType;
    use crate::repository::error::RepositoryResult;
    use crate::repository::identifier_repo::IdentifierRepository;
    use async_trait::async_trait;

    // 属性 10 值 "B-1" 属于资源 21；资源 21 存在
    struct FakeStore;

    #[async_trait]
    impl IdentifierRepository for FakeStore {
        async fn find_existing_ids(
            &self,
            ids: &[i64],
            _resource_type: Option<ResourceType>,
        ) -> RepositoryResult<Vec<i64>> {
            Ok(ids.iter().copied().filter(|id| *id == 21).collect())
        }

        async fn find_property_values(
            &self,
            property_id: i64,
            values: &[String],
            _resource_type: Option<ResourceType>,
        ) -> RepositoryResult<Vec<IdentifierMatch>> {
            Ok(values
                .iter()
                .filter(|v| property_id == 10 && v.as_str() == "B-1")
                .map(|v| IdentifierMatch {
                    value: v.clone(),
                    resource_id: 21,
                    row_id: 3,
                })
                .collect())
        }

        async fn find_media_sources(
            &self,
            _ingester: &str,
            _sources: &[String],
            _item_id: Option<i64>,
        ) -> RepositoryResult<Vec<IdentifierMatch>> {
            Ok(Vec::new())
        }
    }

    fn checker(policy: DuplicatePolicy) -> IdentityChecker {
        IdentityChecker::new(
            Arc::new(IdentifierResolver::new(Arc::new(FakeStore))),
            vec![
                NormalizedIdentifier {
                    label: "o:id".to_string(),
                    kind: IdentifierKind::InternalId,
                },
                NormalizedIdentifier {
                    label: "dcterms:identifier".to_string(),
                    kind: IdentifierKind::Property(10),
                },
            ],
            policy,
        )
    }

    fn draft_with_identifier(identifier: &str) -> ResourceDraft {
        let mut draft = ResourceDraft::prototype(ResourceType::Items, Some(1), true, None, None);
        draft.values.push(PropertyValue {
            property_id: 10,
            datatype: "literal".to_string(),
            language: None,
            is_public: true,
            content: ValueContent::Literal {
                value: identifier.to_string(),
            },
        });
        draft
    }

    #[tokio::test]
    async fn test_unique_identifier_passes() {
        let mut draft = draft_with_identifier("B-9");
        assert!(checker(DuplicatePolicy::Reject).check(&mut draft, 1).await.unwrap());
        assert_eq!(draft.resource_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_under_reject_policy() {
        let mut draft = draft_with_identifier("B-1");
        assert!(!checker(DuplicatePolicy::Reject).check(&mut draft, 1).await.unwrap());
        assert_eq!(draft.resource_id, Some(21));
        assert!(draft.has_error);
    }

    #[tokio::test]
    async fn test_duplicate_allowed_under_allow_policy() {
        let mut draft = draft_with_identifier("B-1");
        assert!(checker(DuplicatePolicy::Allow).check(&mut draft, 1).await.unwrap());
        assert_eq!(draft.resource_id, Some(21));
        assert!(!draft.has_error);
    }

    #[tokio::test]
    async fn test_unchecked_missing_id_is_cleared() {
        let mut draft = draft_with_identifier("B-9");
        draft.resource_id = Some(99);

        assert!(checker(DuplicatePolicy::Reject).check(&mut draft, 1).await.unwrap());
        assert_eq!(draft.resource_id, None);
    }

    #[tokio::test]
    async fn test_errored_draft_fails_fast() {
        let mut draft = draft_with_identifier("B-9");
        draft.has_error = true;
        assert!(!checker(DuplicatePolicy::Allow).check(&mut draft, 1).await.unwrap());
    }
}
