// ==========================================
// 批量导入引擎 - 标识符领域模型
// ==========================================
// 职责: 标识符种类、查询、解析结果
// 约束: 查询内标识符去重、去空白，保持原始顺序
// ==========================================

use crate::domain::types::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ==========================================
// IdentifierKind - 标识符种类（已规范化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// 内部 id（数值）
    InternalId,
    /// 属性值（property_id）
    Property(i64),
    /// 媒体来源（ingester + 可选父条目）
    MediaSource {
        ingester: String,
        item_id: Option<i64>,
    },
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::InternalId => write!(f, "internal_id"),
            IdentifierKind::Property(id) => write!(f, "property#{}", id),
            IdentifierKind::MediaSource { ingester, item_id } => match item_id {
                Some(item) => write!(f, "media_source:{}@item#{}", ingester, item),
                None => write!(f, "media_source:{}", ingester),
            },
        }
    }
}

// ==========================================
// IdentifierName - 配置中的标识符名称（未规范化）
// ==========================================
// 写法:
// - "o:id" / "internal_id"
// - 12（属性 id）
// - "dcterms:identifier"（属性术语）
// - "url" / "file"（媒体 ingester）
// - {"o:ingester": "url", "o:item": 3}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentifierName {
    PropertyId(i64),
    Name(String),
    MediaSource {
        #[serde(rename = "o:ingester")]
        ingester: String,
        #[serde(rename = "o:item", default, skip_serializing_if = "Option::is_none")]
        item_id: Option<i64>,
    },
}

impl IdentifierName {
    pub fn is_internal_id(&self) -> bool {
        matches!(self, IdentifierName::Name(n) if n == "o:id" || n == "internal_id")
    }
}

impl fmt::Display for IdentifierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierName::PropertyId(id) => write!(f, "{}", id),
            IdentifierName::Name(name) => write!(f, "{}", name),
            IdentifierName::MediaSource { ingester, .. } => write!(f, "o:ingester={}", ingester),
        }
    }
}

// ==========================================
// IdentifierQuery - 标识符查询
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierQuery {
    identifiers: Vec<String>,
    pub kind: IdentifierKind,
    pub resource_type: Option<ResourceType>,
}

impl IdentifierQuery {
    /// 创建查询（自动 trim、去空、去重，保持首次出现顺序）
    pub fn new<I, S>(identifiers: I, kind: IdentifierKind, resource_type: Option<ResourceType>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identifiers: normalize_identifiers(identifiers),
            kind,
            resource_type,
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// 规范化标识符列表：Unicode 空白 trim → 去空 → 去重（保序）
pub fn normalize_identifiers<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

// ==========================================
// IdentifierMatch - 存储层返回的候选行
// ==========================================
// row_id: 值行 id（媒体来源时与 resource_id 相同）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatch {
    pub value: String,
    pub resource_id: i64,
    pub row_id: i64,
}

// ==========================================
// Resolution - 有序解析结果
// ==========================================
// 不变量: 条目数 == 查询标识符数，未找到为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    entries: Vec<(String, Option<i64>)>,
}

impl Resolution {
    /// 以全部未找到初始化
    pub fn unresolved(identifiers: &[String]) -> Self {
        Self {
            entries: identifiers.iter().map(|i| (i.clone(), None)).collect(),
        }
    }

    pub(crate) fn set(&mut self, identifier: &str, id: i64) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == identifier) {
            entry.1 = Some(id);
        }
    }

    pub fn get(&self, identifier: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(k, _)| k == identifier)
            .and_then(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<i64>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 第一个已解析的 id（按查询顺序）
    pub fn first_resolved(&self) -> Option<i64> {
        self.entries.iter().find_map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalizes_identifiers() {
        let query = IdentifierQuery::new(
            vec![" a ", "b", "", "a", "\u{00a0}c\t", "b"],
            IdentifierKind::InternalId,
            None,
        );
        assert_eq!(query.identifiers(), &["a", "b", "c"]);
    }

    #[test]
    fn test_identifier_name_deserialize() {
        let names: Vec<IdentifierName> = serde_json::from_str(
            r#"["o:id", 10, "dcterms:identifier", {"o:ingester": "url", "o:item": 3}]"#,
        )
        .unwrap();

        assert!(names[0].is_internal_id());
        assert_eq!(names[1], IdentifierName::PropertyId(10));
        assert_eq!(names[2], IdentifierName::Name("dcterms:identifier".to_string()));
        assert_eq!(
            names[3],
            IdentifierName::MediaSource {
                ingester: "url".to_string(),
                item_id: Some(3)
            }
        );
    }

    #[test]
    fn test_resolution_keeps_every_identifier() {
        let ids = vec!["x".to_string(), "y".to_string()];
        let mut resolution = Resolution::unresolved(&ids);
        resolution.set("y", 9);

        assert_eq!(resolution.len(), 2);
        assert_eq!(resolution.get("x"), None);
        assert_eq!(resolution.get("y"), Some(9));
        assert_eq!(resolution.first_resolved(), Some(9));
    }
}
