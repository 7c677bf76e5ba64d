// ==========================================
// 批量导入引擎 - 字段映射模型
// ==========================================
// 职责: 原始映射（源字段 → 目标字符串列表）与编译后的映射表
// 约束: 编译后不可变；目标动作在编译期确定，构建期只按标签分派
// ==========================================

use crate::domain::types::DataType;
use serde::{Deserialize, Serialize};

// ==========================================
// RawFieldMapping - 原始映射行（保持配置顺序）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldMapping {
    pub source: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl RawFieldMapping {
    pub fn new<S: Into<String>>(source: S, targets: &[&str]) -> Self {
        Self {
            source: source.into(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }
}

// ==========================================
// FieldMetadata - 源字段自动识别结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub field: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

// ==========================================
// PropertyValueSpec - 属性值规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValueSpec {
    pub property_id: i64,
    pub datatype: DataType,
    pub language: Option<String>,
    pub is_public: bool,
}

// ==========================================
// GenericAttribute - 通用属性（封闭集合）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericAttribute {
    InternalId,
    Template,
    Class,
    Owner,
    Visibility,
    ItemSet,
    Item,
    Ingester,
    Source,
}

impl GenericAttribute {
    /// 识别通用属性目标名称
    pub fn parse(target: &str) -> Option<Self> {
        match target {
            "o:id" | "internal_id" => Some(GenericAttribute::InternalId),
            "o:resource_template" | "template" => Some(GenericAttribute::Template),
            "o:resource_class" | "class" => Some(GenericAttribute::Class),
            "o:owner" | "o:email" | "owner" | "email" => Some(GenericAttribute::Owner),
            "o:is_public" | "visibility" => Some(GenericAttribute::Visibility),
            "o:item_set" => Some(GenericAttribute::ItemSet),
            "o:item" => Some(GenericAttribute::Item),
            "o:ingester" => Some(GenericAttribute::Ingester),
            "o:source" => Some(GenericAttribute::Source),
            _ => None,
        }
    }
}

// ==========================================
// NestedTarget - 嵌套目标 outer{inner} 的内层部分
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTarget {
    pub target_data: String,
    pub target_data_value: Option<PropertyValueSpec>,
}

// ==========================================
// TargetAction - 目标动作（标签变体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TargetAction {
    /// 属性填充
    Property(PropertyValueSpec),
    /// 通用属性填充
    Generic(GenericAttribute),
    /// 兜底：目标名 ← 最后一个值
    Fallback {
        datatype: Option<String>,
        language: Option<String>,
    },
}

// ==========================================
// TargetRule - 单个目标规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRule {
    pub field: String,
    pub target: String,
    pub nested: Option<NestedTarget>,
    pub action: TargetAction,
}

// ==========================================
// MappingEntry - 源字段及其目标规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source: String,
    pub rules: Vec<TargetRule>,
}

// ==========================================
// CompiledMapping - 编译后的映射表（保持源字段顺序）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMapping {
    pub entries: Vec<MappingEntry>,
}

impl CompiledMapping {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingEntry> {
        self.entries.iter()
    }
}
