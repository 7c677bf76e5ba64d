// ==========================================
// 批量导入引擎 - 导入运行配置
// ==========================================
// 职责: 单次运行的配置（资源类型、标识符优先级、重复策略、批大小、默认值、映射）
// 格式: JSON（字段缺省取默认值）
// ==========================================

use crate::domain::identifier::IdentifierName;
use crate::domain::mapping::RawFieldMapping;
use crate::domain::types::{DuplicatePolicy, ResourceType};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认批大小
pub const DEFAULT_ENTRIES_BY_BATCH: usize = 20;

/// 所有者取值 "current" 表示调用者本人
pub const CURRENT_OWNER: &str = "current";

// ==========================================
// OwnerSetting - 所有者配置
// ==========================================
// 写法: 4 / "ada@example.org" / "current"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerSetting {
    Id(i64),
    Named(String),
}

impl OwnerSetting {
    pub fn is_current(&self) -> bool {
        matches!(self, OwnerSetting::Named(name) if name.trim().is_empty() || name.trim() == CURRENT_OWNER)
    }
}

impl Default for OwnerSetting {
    fn default() -> Self {
        OwnerSetting::Named(CURRENT_OWNER.to_string())
    }
}

// ==========================================
// ImportRunConfig - 运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRunConfig {
    pub resource_type: ResourceType,
    /// 标识符名称（按优先级）
    pub identifier_names: Vec<IdentifierName>,
    pub duplicate_policy: DuplicatePolicy,
    pub entries_by_batch: usize,
    pub template: Option<String>,
    pub class: Option<String>,
    pub owner: OwnerSetting,
    /// 调用者用户 id（owner 为 "current" 时使用）
    pub current_user_id: Option<i64>,
    pub is_public: bool,
    /// 多值分隔符
    pub separator: Option<String>,
    pub mapping: Vec<RawFieldMapping>,
}

impl Default for ImportRunConfig {
    fn default() -> Self {
        Self {
            resource_type: ResourceType::Items,
            identifier_names: vec![
                IdentifierName::Name("o:id".to_string()),
                IdentifierName::Name("dcterms:identifier".to_string()),
            ],
            duplicate_policy: DuplicatePolicy::Reject,
            entries_by_batch: DEFAULT_ENTRIES_BY_BATCH,
            template: None,
            class: None,
            owner: OwnerSetting::default(),
            current_user_id: None,
            is_public: true,
            separator: None,
            mapping: Vec::new(),
        }
    }
}

impl ImportRunConfig {
    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// 校验配置
    ///
    /// # 规则
    /// - 资源类型必须是具体类型（items / item_sets / media）
    /// - 批大小 > 0
    /// - owner 为 "current" 时必须提供 current_user_id
    pub fn validate(&self) -> ImportResult<()> {
        if !self.resource_type.is_concrete() {
            return Err(ImportError::ConfigValueError {
                key: "resource_type".to_string(),
                value: self.resource_type.to_string(),
                message: "导入需要具体资源类型".to_string(),
            });
        }

        if self.entries_by_batch == 0 {
            return Err(ImportError::ConfigValueError {
                key: "entries_by_batch".to_string(),
                value: "0".to_string(),
                message: "批大小必须大于 0".to_string(),
            });
        }

        if self.owner.is_current() && self.current_user_id.is_none() {
            return Err(ImportError::ConfigValueError {
                key: "owner".to_string(),
                value: CURRENT_OWNER.to_string(),
                message: "未提供当前用户 id".to_string(),
            });
        }

        Ok(())
    }

    /// 分隔符（空字符串视为未配置）
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref().filter(|s| !s.is_empty())
    }
}
