// ==========================================
// 批量导入引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 标识符解析（确定性平局裁决）+ 字段映射与分批导入管道
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 标识符、映射、草稿、运行
pub mod domain;

// 数据仓储层 - 标识符查询、元数据查询、资源写入
pub mod repository;

// 引擎层 - 标识符解析
pub mod engine;

// 导入层 - 条目来源、映射编译、资源构建、批量管道
pub mod importer;

// 配置层 - 运行配置、导入方案
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// API 层
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use api::{ApiError, ApiResult, ImportApi};
pub use config::{ConfigManager, ImportRunConfig};
pub use domain::{
    DuplicatePolicy, IdentifierKind, IdentifierQuery, ResourceType, Resolution, RunCounters,
    RunSummary,
};
pub use engine::IdentifierResolver;
pub use importer::{BatchImporter, BulkImporter, EntrySource, ImportError, ImportResult};

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "批量导入引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
