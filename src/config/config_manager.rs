// ==========================================
// 批量导入引擎 - 配置管理器
// ==========================================
// 职责: 全局配置读写、导入方案（import profile）的保存与加载
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::ImportRunConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::info;

/// 配置键
pub mod config_keys {
    /// 导入方案前缀: import_profile/{name}
    pub const IMPORT_PROFILE_PREFIX: &str = "import_profile/";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取导入方案
    ///
    /// # 返回
    /// - Some(ImportRunConfig): 已保存的方案
    /// - None: 方案不存在或名称为空
    pub fn get_import_profile(&self, name: &str) -> RepositoryResult<Option<ImportRunConfig>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let key = format!("{}{}", config_keys::IMPORT_PROFILE_PREFIX, name);
        let Some(raw) = self.get_global_config_value(&key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// 保存导入方案（同名覆盖）
    pub fn save_import_profile(&self, name: &str, config: &ImportRunConfig) -> RepositoryResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError(
                "导入方案名称不能为空".to_string(),
            ));
        }

        let key = format!("{}{}", config_keys::IMPORT_PROFILE_PREFIX, name);
        let raw = serde_json::to_string(config)?;
        self.set_global_config_value(&key, &raw)?;
        info!(profile = %name, "导入方案已保存");
        Ok(())
    }

    /// 列出已保存的导入方案名称（按名称排序）
    pub fn list_import_profiles(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM config_kv WHERE scope_id = 'global' AND key LIKE ?1 ORDER BY key",
        )?;
        let pattern = format!("{}%", config_keys::IMPORT_PROFILE_PREFIX);
        let names = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(config_keys::IMPORT_PROFILE_PREFIX)
                    .map(str::to_string)
            })
            .collect();
        Ok(names)
    }
}
