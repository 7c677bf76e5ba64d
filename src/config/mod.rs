// ==========================================
// 批量导入引擎 - 配置层
// ==========================================
// 职责: 导入运行配置、导入方案持久化
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config;

pub use config_manager::{config_keys, ConfigManager};
pub use import_config::{ImportRunConfig, OwnerSetting, CURRENT_OWNER, DEFAULT_ENTRIES_BY_BATCH};
