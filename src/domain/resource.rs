// ==========================================
// 批量导入引擎 - 资源草稿与载荷
// ==========================================
// 职责: 单条目构建期间的草稿（含处理元数据），提交给写入端的载荷
// 生命周期: 每条目从原型克隆 → 构建器单次填充 → 入批或丢弃
// ==========================================

use crate::domain::types::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ValueContent - 属性值内容（按值种类区分）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueContent {
    Literal { value: String },
    Uri { uri: String, label: Option<String> },
    Resource { value_resource_id: i64 },
}

// ==========================================
// PropertyValue - 单个属性值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub property_id: i64,
    pub datatype: String,
    pub language: Option<String>,
    pub is_public: bool,
    pub content: ValueContent,
}

impl PropertyValue {
    /// 字面量文本（非字面量返回 None）
    pub fn literal(&self) -> Option<&str> {
        match &self.content {
            ValueContent::Literal { value } => Some(value),
            _ => None,
        }
    }
}

// ==========================================
// ResourceDraft - 资源草稿
// ==========================================
// 通用属性为封闭集合，属性值为有序列表；无法识别的目标进入 extra（后值覆盖前值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDraft {
    // ===== 处理元数据 =====
    pub resource_id: Option<i64>,
    pub id_checked: bool,
    pub has_error: bool,

    // ===== 通用属性 =====
    pub resource_type: ResourceType,
    pub owner_id: Option<i64>,
    pub is_public: bool,
    pub template_id: Option<i64>,
    pub class_id: Option<i64>,

    // ===== 关联 =====
    pub item_set_ids: Vec<i64>, // 条目所属条目集
    pub item_id: Option<i64>,   // 媒体父条目

    // ===== 媒体属性 =====
    pub ingester: Option<String>,
    pub source: Option<String>,

    // ===== 属性值 =====
    pub values: Vec<PropertyValue>,

    // ===== 兜底属性（目标名 → 最后一个值）=====
    pub extra: Vec<(String, String)>,
}

impl ResourceDraft {
    /// 创建原型草稿（携带运行级默认值）
    pub fn prototype(
        resource_type: ResourceType,
        owner_id: Option<i64>,
        is_public: bool,
        template_id: Option<i64>,
        class_id: Option<i64>,
    ) -> Self {
        Self {
            resource_id: None,
            id_checked: false,
            has_error: false,
            resource_type,
            owner_id,
            is_public,
            template_id,
            class_id,
            item_set_ids: Vec::new(),
            item_id: None,
            ingester: None,
            source: None,
            values: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// 设置兜底属性（同名覆盖）
    pub fn set_extra(&mut self, target: &str, value: String) {
        match self.extra.iter_mut().find(|(k, _)| k == target) {
            Some(entry) => entry.1 = value,
            None => self.extra.push((target.to_string(), value)),
        }
    }

    pub fn extra(&self, target: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == target)
            .map(|(_, v)| v.as_str())
    }

    /// 指定属性的全部值
    pub fn values_of(&self, property_id: i64) -> impl Iterator<Item = &PropertyValue> {
        self.values.iter().filter(move |v| v.property_id == property_id)
    }

    /// 转为写入载荷（丢弃处理元数据；导入只创建新资源，不携带已匹配的 id）
    pub fn into_payload(self) -> ResourcePayload {
        ResourcePayload {
            resource_type: self.resource_type,
            owner_id: self.owner_id,
            is_public: self.is_public,
            template_id: self.template_id,
            class_id: self.class_id,
            item_set_ids: self.item_set_ids,
            item_id: self.item_id,
            ingester: self.ingester,
            source: self.source,
            values: self.values,
            extra: self.extra,
        }
    }
}

// ==========================================
// ResourcePayload - 写入载荷
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePayload {
    pub resource_type: ResourceType,
    pub owner_id: Option<i64>,
    pub is_public: bool,
    pub template_id: Option<i64>,
    pub class_id: Option<i64>,
    pub item_set_ids: Vec<i64>,
    pub item_id: Option<i64>,
    pub ingester: Option<String>,
    pub source: Option<String>,
    pub values: Vec<PropertyValue>,
    pub extra: Vec<(String, String)>,
}

// ==========================================
// CreatedResource - 写入端返回的已创建资源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub id: i64,
    pub resource_type: ResourceType,
    pub created_at: DateTime<Utc>,
}
