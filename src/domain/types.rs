// ==========================================
// 批量导入引擎 - 领域类型定义
// ==========================================
// 职责: 资源类型、重复策略、数据类型（值种类）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 资源类型 (Resource Type)
// ==========================================
// 序列化格式: snake_case 复数（与 API 名称一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Items,     // 条目
    ItemSets,  // 条目集
    Media,     // 媒体
    Resources, // 任意资源（不过滤类型）
}

impl ResourceType {
    /// 解析资源类型名称（支持 API 名称、属性名称、实体名称三种写法）
    ///
    /// # 返回
    /// - Some(ResourceType): 已知名称
    /// - None: 不支持的名称
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "items" | "o:item" | "Item" => Some(ResourceType::Items),
            "item_sets" | "o:item_set" | "ItemSet" => Some(ResourceType::ItemSets),
            "media" | "o:media" | "Media" => Some(ResourceType::Media),
            "resources" | "Resource" => Some(ResourceType::Resources),
            _ => None,
        }
    }

    /// API 名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Items => "items",
            ResourceType::ItemSets => "item_sets",
            ResourceType::Media => "media",
            ResourceType::Resources => "resources",
        }
    }

    /// 存储层实体名称（resource.resource_type 列）
    ///
    /// Resources 不对应具体实体，返回 None 表示不过滤。
    pub fn entity_name(&self) -> Option<&'static str> {
        match self {
            ResourceType::Items => Some("Item"),
            ResourceType::ItemSets => Some("ItemSet"),
            ResourceType::Media => Some("Media"),
            ResourceType::Resources => None,
        }
    }

    /// 日志中使用的单数标签
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Items => "item",
            ResourceType::ItemSets => "item set",
            ResourceType::Media => "media",
            ResourceType::Resources => "resource",
        }
    }

    /// 是否为具体资源类型
    pub fn is_concrete(&self) -> bool {
        self.entity_name().is_some()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 重复标识符策略 (Duplicate Policy)
// ==========================================
// Allow: 记录警告后仍作为新资源创建
// Reject: 记录错误并将条目排除出批次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    Allow,
    #[default]
    Reject,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Allow => write!(f, "allow"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

// ==========================================
// 值种类 (Value Kind)
// ==========================================
// 决定属性值的结构：字面量 / URI / 资源引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Literal,
    Uri,
    Resource(ResourceType),
}

// ==========================================
// 数据类型 (Data Type)
// ==========================================
// name 保留原始数据类型名（写入 value.type 列），kind 用于分派
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    pub kind: ValueKind,
}

impl DataType {
    /// 字面量数据类型（默认）
    pub fn literal() -> Self {
        Self {
            name: "literal".to_string(),
            kind: ValueKind::Literal,
        }
    }

    /// 解析数据类型名称
    ///
    /// # 规则
    /// - literal / customvocab:* / numeric:* → 字面量
    /// - uri / valuesuggest:* → URI
    /// - resource / resource:item / resource:itemset / resource:media → 资源引用
    /// - 其他 → None
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let kind = match name {
            "literal" => ValueKind::Literal,
            "uri" => ValueKind::Uri,
            "resource" => ValueKind::Resource(ResourceType::Resources),
            "resource:item" => ValueKind::Resource(ResourceType::Items),
            "resource:itemset" => ValueKind::Resource(ResourceType::ItemSets),
            "resource:media" => ValueKind::Resource(ResourceType::Media),
            n if n.starts_with("valuesuggest:") => ValueKind::Uri,
            n if n.starts_with("customvocab:") || n.starts_with("numeric:") => ValueKind::Literal,
            _ => return None,
        };

        Some(Self {
            name: name.to_string(),
            kind,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_aliases() {
        assert_eq!(ResourceType::parse("o:item_set"), Some(ResourceType::ItemSets));
        assert_eq!(ResourceType::parse("Media"), Some(ResourceType::Media));
        assert_eq!(ResourceType::parse("resources"), Some(ResourceType::Resources));
        assert_eq!(ResourceType::parse("users"), None);
        assert!(!ResourceType::Resources.is_concrete());
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!(DataType::parse("literal").unwrap().kind, ValueKind::Literal);
        assert_eq!(DataType::parse("valuesuggest:geonames").unwrap().kind, ValueKind::Uri);
        assert_eq!(
            DataType::parse("resource:item").unwrap().kind,
            ValueKind::Resource(ResourceType::Items)
        );
        assert_eq!(DataType::parse("customvocab:12").unwrap().kind, ValueKind::Literal);
        assert!(DataType::parse("geometry").is_none());
    }
}
