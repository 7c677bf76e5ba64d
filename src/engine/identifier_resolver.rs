// ==========================================
// 批量导入引擎 - 标识符解析器
// ==========================================
// 职责: 用户标识符（内部 id / 属性值 / 媒体来源）→ 资源 id
// 平局裁决:
// 1) 候选行按 (resource_id, row_id) 升序
// 2) 先取第一条大小写敏感的精确匹配
// 3) 否则取第一条大小写不敏感匹配
// 4) 都没有 → None
// 短路: 不支持的组合（html 媒体来源、非正属性 id、未知类型名）返回空结果（不是错误）
// 媒体来源固定按媒体类型查询
// ==========================================

use crate::domain::identifier::{
    IdentifierKind, IdentifierMatch, IdentifierName, IdentifierQuery, Resolution,
};
use crate::domain::types::ResourceType;
use crate::repository::error::RepositoryResult;
use crate::repository::identifier_repo::IdentifierRepository;
use crate::repository::metadata_repo::MetadataRepository;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 不支持作为标识符的媒体 ingester
const UNSUPPORTED_INGESTERS: &[&str] = &["html"];

// ==========================================
// NormalizedIdentifier - 规范化后的标识符名称
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentifier {
    /// 日志标签（属性术语 / o:id / ingester）
    pub label: String,
    pub kind: IdentifierKind,
}

// ==========================================
// IdentifierResolver
// ==========================================
pub struct IdentifierResolver {
    repo: Arc<dyn IdentifierRepository>,
}

impl IdentifierResolver {
    pub fn new(repo: Arc<dyn IdentifierRepository>) -> Self {
        Self { repo }
    }

    /// 解析一组标识符
    ///
    /// # 返回
    /// - Ok(Resolution): 每个（去重后的）标识符一项，未找到为 None
    /// - Ok(空): 查询为空或种类/资源类型组合不支持
    /// - Err: 存储层失败
    #[instrument(skip(self, query), fields(kind = %query.kind, count = query.identifiers().len()))]
    pub async fn resolve(&self, query: &IdentifierQuery) -> RepositoryResult<Resolution> {
        if query.is_empty() {
            return Ok(Resolution::default());
        }

        let Some(resource_type) = Self::effective_resource_type(&query.kind, query.resource_type)
        else {
            debug!(resource_type = ?query.resource_type, "标识符种类与资源类型组合不支持，短路返回");
            return Ok(Resolution::default());
        };

        let identifiers = query.identifiers();
        match &query.kind {
            IdentifierKind::InternalId => self.resolve_internal_ids(identifiers, resource_type).await,
            IdentifierKind::Property(property_id) => {
                let matches = self
                    .repo
                    .find_property_values(*property_id, identifiers, resource_type)
                    .await?;
                Ok(pick_matches(identifiers, matches))
            }
            IdentifierKind::MediaSource { ingester, item_id } => {
                let matches = self
                    .repo
                    .find_media_sources(ingester, identifiers, *item_id)
                    .await?;
                Ok(pick_matches(identifiers, matches))
            }
        }
    }

    /// 解析资源类型名称后再解析标识符（未知资源类型名称短路）
    pub async fn resolve_with_type_name<I, S>(
        &self,
        identifiers: I,
        kind: IdentifierKind,
        resource_type: Option<&str>,
    ) -> RepositoryResult<Resolution>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resource_type = match resource_type {
            Some(name) => match ResourceType::parse(name) {
                Some(t) => Some(t),
                None => {
                    debug!(resource_type = name, "未知资源类型，短路返回");
                    return Ok(Resolution::default());
                }
            },
            None => None,
        };
        self.resolve(&IdentifierQuery::new(identifiers, kind, resource_type))
            .await
    }

    /// 单个标识符的便捷形式
    pub async fn resolve_one(
        &self,
        identifier: &str,
        kind: IdentifierKind,
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Option<i64>> {
        let query = IdentifierQuery::new([identifier], kind, resource_type);
        let resolution = self.resolve(&query).await?;
        Ok(resolution.first_resolved())
    }

    /// 规范化配置中的标识符名称
    ///
    /// # 规则
    /// - "o:id" / "internal_id" → 内部 id
    /// - 整数 → 属性（不校验存在性）
    /// - 可解析的属性术语 → 属性
    /// - "url" / "file" → 媒体来源
    /// - {"o:ingester", "o:item"} → 限定父条目的媒体来源（html 不支持）
    /// - 其他 → None
    pub async fn normalize_name(
        name: &IdentifierName,
        metadata: &dyn MetadataRepository,
    ) -> RepositoryResult<Option<NormalizedIdentifier>> {
        let normalized = match name {
            IdentifierName::MediaSource { ingester, item_id } => {
                if ingester.trim().is_empty() || UNSUPPORTED_INGESTERS.contains(&ingester.as_str())
                {
                    return Ok(None);
                }
                Some(NormalizedIdentifier {
                    label: ingester.clone(),
                    kind: IdentifierKind::MediaSource {
                        ingester: ingester.clone(),
                        item_id: *item_id,
                    },
                })
            }
            _ if name.is_internal_id() => Some(NormalizedIdentifier {
                label: "o:id".to_string(),
                kind: IdentifierKind::InternalId,
            }),
            IdentifierName::PropertyId(id) if *id > 0 => Some(NormalizedIdentifier {
                label: id.to_string(),
                kind: IdentifierKind::Property(*id),
            }),
            IdentifierName::PropertyId(_) => None,
            IdentifierName::Name(term) => match metadata.find_property_id(term).await? {
                Some(id) => {
                    let label = metadata
                        .get_property_term(id)
                        .await?
                        .unwrap_or_else(|| term.clone());
                    Some(NormalizedIdentifier {
                        label,
                        kind: IdentifierKind::Property(id),
                    })
                }
                None if term == "url" || term == "file" => Some(NormalizedIdentifier {
                    label: term.clone(),
                    kind: IdentifierKind::MediaSource {
                        ingester: term.clone(),
                        item_id: None,
                    },
                }),
                None => None,
            },
        };
        Ok(normalized)
    }

    /// 计算实际使用的资源类型过滤
    ///
    /// # 返回
    /// - Some(None): 不过滤
    /// - Some(Some(t)): 按 t 过滤
    /// - None: 组合不支持
    fn effective_resource_type(
        kind: &IdentifierKind,
        resource_type: Option<ResourceType>,
    ) -> Option<Option<ResourceType>> {
        let filter = resource_type.filter(|t| t.is_concrete());
        match kind {
            IdentifierKind::MediaSource { ingester, .. } => {
                // 媒体来源只能定位媒体，传入的类型过滤被忽略
                if UNSUPPORTED_INGESTERS.contains(&ingester.as_str()) {
                    return None;
                }
                Some(Some(ResourceType::Media))
            }
            IdentifierKind::Property(property_id) if *property_id <= 0 => None,
            _ => Some(filter),
        }
    }

    async fn resolve_internal_ids(
        &self,
        identifiers: &[String],
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Resolution> {
        let mut resolution = Resolution::unresolved(identifiers);

        let candidates: Vec<(&str, i64)> = identifiers
            .iter()
            .filter_map(|i| i.parse::<i64>().ok().filter(|id| *id > 0).map(|id| (i.as_str(), id)))
            .collect();
        if candidates.is_empty() {
            return Ok(resolution);
        }

        let ids: Vec<i64> = candidates.iter().map(|(_, id)| *id).collect();
        let found = self.repo.find_existing_ids(&ids, resource_type).await?;
        for (identifier, id) in candidates {
            if found.binary_search(&id).is_ok() {
                resolution.set(identifier, id);
            }
        }

        Ok(resolution)
    }
}

/// 按平局裁决规则为每个标识符挑选资源 id
pub fn pick_matches(identifiers: &[String], mut matches: Vec<IdentifierMatch>) -> Resolution {
    matches.sort_by_key(|m| (m.resource_id, m.row_id));

    let lowered: Vec<String> = matches.iter().map(|m| m.value.to_lowercase()).collect();
    let mut resolution = Resolution::unresolved(identifiers);

    for identifier in identifiers {
        if let Some(m) = matches.iter().find(|m| &m.value == identifier) {
            resolution.set(identifier, m.resource_id);
            continue;
        }

        let lower = identifier.to_lowercase();
        if let Some(pos) = lowered.iter().position(|v| *v == lower) {
            resolution.set(identifier, matches[pos].resource_id);
        }
    }

    resolution
}
