// ==========================================
// 批量导入引擎 - 资源构建器
// ==========================================
// 职责: 条目 + 编译后映射 + 原型草稿 → 资源草稿
// 流程:
// 1) 空条目 → 跳过
// 2) 按映射表顺序取源字段值，按分隔符拆分、修剪、去空
// 3) 按目标动作填充：属性值 / 通用属性 / 兜底
// 条目级问题只标记 has_error，不中断构建；存储层失败向上返回
// ==========================================

use crate::domain::identifier::{IdentifierKind, IdentifierQuery, Resolution};
use crate::domain::mapping::{
    CompiledMapping, GenericAttribute, PropertyValueSpec, TargetAction, TargetRule,
};
use crate::domain::resource::{PropertyValue, ResourceDraft, ValueContent};
use crate::domain::types::{ResourceType, ValueKind};
use crate::engine::identifier_resolver::IdentifierResolver;
use crate::importer::entry::Entry;
use crate::importer::error::ImportResult;
use crate::repository::metadata_repo::MetadataRepository;
use std::sync::Arc;
use tracing::{error, warn};

/// 可见性为 false 的取值（不区分大小写）
const FALSE_VISIBILITY_VALUES: &[&str] = &["false", "no", "off", "private"];

/// 构建结果
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// 空条目
    Skipped,
    /// 草稿（可能带 has_error）
    Built(ResourceDraft),
}

pub struct ResourceBuilder {
    resolver: Arc<IdentifierResolver>,
    metadata: Arc<dyn MetadataRepository>,
    /// 资源引用值的解析种类（内部 id 之后依次尝试）
    reference_kinds: Vec<IdentifierKind>,
}

impl ResourceBuilder {
    pub fn new(
        resolver: Arc<IdentifierResolver>,
        metadata: Arc<dyn MetadataRepository>,
        reference_kinds: Vec<IdentifierKind>,
    ) -> Self {
        Self {
            resolver,
            metadata,
            reference_kinds,
        }
    }

    /// 构建单个条目
    pub async fn build(
        &self,
        entry: &Entry,
        mapping: &CompiledMapping,
        prototype: &ResourceDraft,
        separator: Option<&str>,
        index: usize,
    ) -> ImportResult<BuildOutcome> {
        if entry.is_empty() {
            return Ok(BuildOutcome::Skipped);
        }

        let mut draft = prototype.clone();
        for mapping_entry in mapping.iter() {
            let Some(raw) = entry.get(&mapping_entry.source) else {
                continue;
            };
            let values = split_values(raw, separator);
            if values.is_empty() {
                continue;
            }

            for rule in &mapping_entry.rules {
                match &rule.action {
                    TargetAction::Property(spec) => {
                        self.fill_property(&mut draft, spec, &values, index).await?
                    }
                    TargetAction::Generic(attribute) => {
                        self.fill_generic(&mut draft, *attribute, rule, &values, index)
                            .await?
                    }
                    TargetAction::Fallback { .. } => {
                        if let Some(last) = values.last() {
                            draft.set_extra(&rule.target, last.clone());
                        }
                    }
                }
            }
        }

        Ok(BuildOutcome::Built(draft))
    }

    async fn fill_property(
        &self,
        draft: &mut ResourceDraft,
        spec: &PropertyValueSpec,
        values: &[String],
        index: usize,
    ) -> ImportResult<()> {
        for value in values {
            let (content, language) = match spec.datatype.kind {
                ValueKind::Literal => (
                    ValueContent::Literal {
                        value: value.clone(),
                    },
                    spec.language.clone(),
                ),
                ValueKind::Uri => (
                    ValueContent::Uri {
                        uri: value.clone(),
                        label: None,
                    },
                    spec.language.clone(),
                ),
                ValueKind::Resource(target_type) => {
                    match self.resolve_reference(value, target_type).await? {
                        Some(value_resource_id) => {
                            (ValueContent::Resource { value_resource_id }, None)
                        }
                        None => {
                            error!(
                                index = index,
                                value = %value,
                                datatype = %spec.datatype,
                                "资源引用值无法解析"
                            );
                            draft.has_error = true;
                            continue;
                        }
                    }
                }
            };

            draft.values.push(PropertyValue {
                property_id: spec.property_id,
                datatype: spec.datatype.name.clone(),
                language,
                is_public: spec.is_public,
                content,
            });
        }
        Ok(())
    }

    async fn fill_generic(
        &self,
        draft: &mut ResourceDraft,
        attribute: GenericAttribute,
        rule: &TargetRule,
        values: &[String],
        index: usize,
    ) -> ImportResult<()> {
        let Some(last) = values.last() else {
            return Ok(());
        };

        match attribute {
            GenericAttribute::InternalId => {
                // 非数值或 0 视为未提供
                let id = last.parse::<i64>().unwrap_or(0);
                if id <= 0 {
                    return Ok(());
                }
                let resource_type = draft.resource_type;
                match self
                    .resolver
                    .resolve_one(last, IdentifierKind::InternalId, Some(resource_type))
                    .await?
                {
                    Some(found) => {
                        draft.resource_id = Some(found);
                        draft.id_checked = resource_type.is_concrete();
                    }
                    None => {
                        error!(index = index, id = id, resource_type = %resource_type, "内部 id 不存在");
                        draft.has_error = true;
                    }
                }
            }
            GenericAttribute::Template => {
                match self.metadata.find_resource_template_id(last).await? {
                    Some(id) => draft.template_id = Some(id),
                    None => warn!(index = index, value = %last, "资源模板不存在，保留默认值"),
                }
            }
            GenericAttribute::Class => match self.metadata.find_resource_class_id(last).await? {
                Some(id) => draft.class_id = Some(id),
                None => warn!(index = index, value = %last, "资源类不存在，保留默认值"),
            },
            GenericAttribute::Owner => match self.metadata.find_user_id(last).await? {
                Some(id) => draft.owner_id = Some(id),
                None => warn!(index = index, value = %last, "所有者不存在，保留默认值"),
            },
            GenericAttribute::Visibility => {
                draft.is_public = parse_visibility(last);
            }
            GenericAttribute::ItemSet => {
                if draft.resource_type != ResourceType::Items {
                    warn!(index = index, resource_type = %draft.resource_type, "仅条目可归属条目集，忽略");
                    return Ok(());
                }
                let resolution = self
                    .resolve_relation(values, rule, ResourceType::ItemSets)
                    .await?;
                for (identifier, found) in resolution.iter() {
                    match found {
                        Some(id) if !draft.item_set_ids.contains(&id) => {
                            draft.item_set_ids.push(id)
                        }
                        Some(_) => {}
                        None => {
                            error!(index = index, identifier = %identifier, "条目集无法解析");
                            draft.has_error = true;
                        }
                    }
                }
            }
            GenericAttribute::Item => {
                if draft.resource_type != ResourceType::Media {
                    warn!(index = index, resource_type = %draft.resource_type, "仅媒体可指定父条目，忽略");
                    return Ok(());
                }
                let resolution = self
                    .resolve_relation(std::slice::from_ref(last), rule, ResourceType::Items)
                    .await?;
                match resolution.first_resolved() {
                    Some(id) => draft.item_id = Some(id),
                    None => {
                        error!(index = index, identifier = %last, "父条目无法解析");
                        draft.has_error = true;
                    }
                }
            }
            GenericAttribute::Ingester => draft.ingester = Some(last.clone()),
            GenericAttribute::Source => draft.source = Some(last.clone()),
        }
        Ok(())
    }

    /// 资源引用值：先按内部 id，再按配置的标识符种类依次尝试
    async fn resolve_reference(
        &self,
        value: &str,
        target_type: ResourceType,
    ) -> ImportResult<Option<i64>> {
        let internal_id = IdentifierKind::InternalId;
        let kinds = std::iter::once(&internal_id).chain(
            self.reference_kinds
                .iter()
                .filter(|k| **k != IdentifierKind::InternalId),
        );
        for kind in kinds {
            if let Some(id) = self
                .resolver
                .resolve_one(value, kind.clone(), Some(target_type))
                .await?
            {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// 关系目标：嵌套属性（outer{inner}）或内部 id
    async fn resolve_relation(
        &self,
        values: &[String],
        rule: &TargetRule,
        target_type: ResourceType,
    ) -> ImportResult<Resolution> {
        let kind = match &rule.nested {
            None => IdentifierKind::InternalId,
            Some(nested) => match &nested.target_data_value {
                Some(spec) => IdentifierKind::Property(spec.property_id),
                None => {
                    let query = IdentifierQuery::new(values, IdentifierKind::InternalId, None);
                    return Ok(Resolution::unresolved(query.identifiers()));
                }
            },
        };
        let query = IdentifierQuery::new(values, kind, Some(target_type));
        Ok(self.resolver.resolve(&query).await?)
    }
}

/// 拆分原始值：按分隔符拆分（未配置则整体为一个值）→ 修剪 → 去空
pub fn split_values(raw: &str, separator: Option<&str>) -> Vec<String> {
    let parts: Vec<&str> = match separator {
        Some(sep) if !sep.is_empty() => raw.split(sep).collect(),
        _ => vec![raw],
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// 可见性解析：false/no/off/private 为 false，其余非空值为 true
pub fn parse_visibility(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !lower.is_empty() && !FALSE_VISIBILITY_VALUES.contains(&lower.as_str())
}
