// ==========================================
// 批量导入引擎 - 领域模型层
// ==========================================
// 职责: 定义标识符、映射、草稿、运行等领域类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod identifier;
pub mod mapping;
pub mod resource;
pub mod run;
pub mod types;

// 重导出核心类型
pub use identifier::{
    normalize_identifiers, IdentifierKind, IdentifierMatch, IdentifierName, IdentifierQuery,
    Resolution,
};
pub use mapping::{
    CompiledMapping, FieldMetadata, GenericAttribute, MappingEntry, NestedTarget,
    PropertyValueSpec, RawFieldMapping, TargetAction, TargetRule,
};
pub use resource::{CreatedResource, PropertyValue, ResourceDraft, ResourcePayload, ValueContent};
pub use run::{RunCounters, RunPhase, RunSummary};
pub use types::{DataType, DuplicatePolicy, ResourceType, ValueKind};
