// ==========================================
// 批量导入引擎 - 字段映射编译器
// ==========================================
// 职责: 原始映射（源字段 → 目标字符串列表）→ 编译后映射表
// 规则:
// 1) 丢弃没有任何非空目标的源字段
// 2) 目标 outer{inner} 拆分为外层目标与嵌套目标
// 3) 外层是属性 → 属性规则；是通用属性 → 通用规则；否则 → 兜底规则
// 4) 没有任何规则的源字段不进入映射表
// 编译结果只依赖输入与元数据查询，重复编译结果相同
// ==========================================

use crate::domain::mapping::{
    CompiledMapping, FieldMetadata, GenericAttribute, MappingEntry, NestedTarget,
    PropertyValueSpec, RawFieldMapping, TargetAction, TargetRule,
};
use crate::domain::types::DataType;
use crate::importer::error::ImportResult;
use crate::repository::metadata_repo::MetadataRepository;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct MappingCompiler {
    metadata: Arc<dyn MetadataRepository>,
}

impl MappingCompiler {
    pub fn new(metadata: Arc<dyn MetadataRepository>) -> Self {
        Self { metadata }
    }

    /// 编译原始映射
    ///
    /// # 返回
    /// - Ok(CompiledMapping): 保持源字段顺序
    /// - Err: 元数据查询失败
    pub async fn compile(&self, raw: &[RawFieldMapping]) -> ImportResult<CompiledMapping> {
        let usable: Vec<&RawFieldMapping> = raw
            .iter()
            .filter(|m| m.targets.iter().any(|t| !t.trim().is_empty()))
            .collect();

        let field_names: Vec<String> = usable.iter().map(|m| m.source.clone()).collect();
        let detected = self.metadata.auto_detect(&field_names);

        let mut entries = Vec::with_capacity(usable.len());
        for (index, mapping) in usable.into_iter().enumerate() {
            let meta = detected.get(index).cloned().unwrap_or_else(|| FieldMetadata {
                field: mapping.source.clone(),
                datatype: None,
                language: None,
            });

            let mut rules = Vec::new();
            for target in &mapping.targets {
                let target = target.trim();
                if target.is_empty() {
                    continue;
                }
                rules.push(self.compile_target(&mapping.source, target, &meta).await?);
            }

            if rules.is_empty() {
                continue;
            }
            entries.push(MappingEntry {
                source: mapping.source.clone(),
                rules,
            });
        }

        debug!(entries = entries.len(), "字段映射编译完成");
        Ok(CompiledMapping { entries })
    }

    async fn compile_target(
        &self,
        source: &str,
        target: &str,
        meta: &FieldMetadata,
    ) -> ImportResult<TargetRule> {
        let (outer, nested) = match split_nested_target(target) {
            Some((outer, inner)) => {
                let target_data_value = match self.metadata.find_property_id(&inner).await? {
                    Some(property_id) => Some(PropertyValueSpec {
                        property_id,
                        datatype: DataType::literal(),
                        language: None,
                        is_public: true,
                    }),
                    None => {
                        warn!(source = %source, target = %target, inner = %inner, "嵌套目标不是已知属性");
                        None
                    }
                };
                (
                    outer,
                    Some(NestedTarget {
                        target_data: inner,
                        target_data_value,
                    }),
                )
            }
            None => (target.to_string(), None),
        };

        let action = if let Some(property_id) = self.metadata.find_property_id(&outer).await? {
            let datatype = meta
                .datatype
                .as_deref()
                .and_then(|hint| self.metadata.get_data_type(hint))
                .unwrap_or_else(DataType::literal);
            TargetAction::Property(PropertyValueSpec {
                property_id,
                datatype,
                language: meta.language.clone(),
                is_public: true,
            })
        } else if let Some(attribute) = GenericAttribute::parse(&outer) {
            TargetAction::Generic(attribute)
        } else {
            TargetAction::Fallback {
                datatype: meta.datatype.clone(),
                language: meta.language.clone(),
            }
        };

        Ok(TargetRule {
            field: meta.field.clone(),
            target: outer,
            nested,
            action,
        })
    }
}

/// 拆分 `outer{inner}`（`{` 必须在首字符之后）
///
/// 外层去除首尾空白，内层去除花括号与空格
pub fn split_nested_target(target: &str) -> Option<(String, String)> {
    let pos = target.find('{')?;
    if pos == 0 {
        return None;
    }
    let outer = target[..pos].trim().to_string();
    let inner = target[pos + 1..]
        .trim_matches(|c: char| c == '{' || c == '}' || c.is_whitespace())
        .to_string();
    Some((outer, inner))
}
