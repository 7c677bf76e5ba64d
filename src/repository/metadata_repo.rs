// ==========================================
// 批量导入引擎 - 元数据查询 Repository Trait
// ==========================================
// 职责: 名称 → id 查询（属性、模板、类、用户）、数据类型识别、源字段自动识别
// 红线: Repository 不含业务规则，只做数据查询
// ==========================================

use crate::domain::mapping::FieldMetadata;
use crate::domain::types::DataType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// MetadataRepository Trait
// ==========================================
// 实现者: MetadataRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// 属性术语（prefix:local_name）或数值 id → 属性 id
    async fn find_property_id(&self, term: &str) -> RepositoryResult<Option<i64>>;

    /// 属性 id → 属性术语
    async fn get_property_term(&self, property_id: i64) -> RepositoryResult<Option<String>>;

    /// 模板 id 或标签 → 模板 id
    async fn find_resource_template_id(&self, value: &str) -> RepositoryResult<Option<i64>>;

    /// 类 id 或术语 → 类 id
    async fn find_resource_class_id(&self, value: &str) -> RepositoryResult<Option<i64>>;

    /// 用户 id、邮箱或名称 → 用户 id
    async fn find_user_id(&self, value: &str) -> RepositoryResult<Option<i64>>;

    /// 数据类型提示 → 数据类型
    fn get_data_type(&self, hint: &str) -> Option<DataType> {
        DataType::parse(hint)
    }

    /// 源字段自动识别（结果与输入按位置对齐）
    fn auto_detect(&self, field_names: &[String]) -> Vec<FieldMetadata> {
        field_names.iter().map(|n| detect_field_metadata(n)).collect()
    }
}

/// 解析源字段名中的标注
///
/// # 写法
/// - `dcterms:title @fr` → 语言 fr
/// - `dcterms:relation ^^resource:item` → 数据类型 resource:item
/// - 其余部分（空白归一）作为字段名
pub fn detect_field_metadata(raw: &str) -> FieldMetadata {
    let mut field_parts = Vec::new();
    let mut datatype = None;
    let mut language = None;

    for token in raw.split_whitespace() {
        if let Some(dt) = token.strip_prefix("^^") {
            if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        } else if let Some(lang) = token.strip_prefix('@') {
            if !lang.is_empty() {
                language = Some(lang.to_string());
            }
        } else {
            field_parts.push(token);
        }
    }

    FieldMetadata {
        field: field_parts.join(" "),
        datatype,
        language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_field_metadata_annotations() {
        let meta = detect_field_metadata("  dcterms:title  @fr ^^literal ");
        assert_eq!(meta.field, "dcterms:title");
        assert_eq!(meta.language.as_deref(), Some("fr"));
        assert_eq!(meta.datatype.as_deref(), Some("literal"));
    }

    #[test]
    fn test_detect_field_metadata_plain() {
        let meta = detect_field_metadata("Main  Title");
        assert_eq!(meta.field, "Main Title");
        assert!(meta.language.is_none());
        assert!(meta.datatype.is_none());
    }
}
