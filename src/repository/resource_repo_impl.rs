// ==========================================
// 批量导入引擎 - 资源写入 Repository 实现
// ==========================================
// 职责: 将载荷写入 resource / value / media / item_item_set / resource_attribute
// 约束: 单条创建一个事务；批量创建一个事务 + 每条一个 savepoint
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::resource::{CreatedResource, ResourcePayload, ValueContent};
use crate::domain::types::ResourceType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::resource_repo::{BatchCreateOptions, ResourceWriteRepository};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ResourceWriteRepositoryImpl
// ==========================================
pub struct ResourceWriteRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ResourceWriteRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与其他仓储共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 写入单个载荷（调用方负责事务）
    fn insert_payload(
        conn: &Connection,
        resource_type: ResourceType,
        payload: &ResourcePayload,
    ) -> RepositoryResult<CreatedResource> {
        let entity = resource_type
            .entity_name()
            .ok_or_else(|| RepositoryError::NonConcreteResourceType(resource_type.to_string()))?;

        let ingester = match resource_type {
            ResourceType::Media => Some(
                payload
                    .ingester
                    .as_deref()
                    .ok_or(RepositoryError::MissingIngester)?,
            ),
            _ => None,
        };

        let created_at = Utc::now();
        conn.execute(
            r#"
            INSERT INTO resource (
                resource_type, owner_id, resource_class_id, resource_template_id, is_public, created
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entity,
                payload.owner_id,
                payload.class_id,
                payload.template_id,
                payload.is_public as i32,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        if resource_type == ResourceType::Items {
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO item_item_set (item_id, item_set_id) VALUES (?1, ?2)",
            )?;
            for item_set_id in &payload.item_set_ids {
                stmt.execute(params![id, item_set_id])?;
            }
        }

        if let Some(ingester) = ingester {
            conn.execute(
                "INSERT INTO media (id, item_id, ingester, source) VALUES (?1, ?2, ?3, ?4)",
                params![id, payload.item_id, ingester, payload.source],
            )?;
        }

        let mut value_stmt = conn.prepare(
            r#"
            INSERT INTO value (
                resource_id, property_id, type, lang, value, uri, value_resource_id, is_public
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        for value in &payload.values {
            let (text, uri, value_resource_id) = match &value.content {
                ValueContent::Literal { value } => (Some(value.as_str()), None, None),
                ValueContent::Uri { uri, label } => (label.as_deref(), Some(uri.as_str()), None),
                ValueContent::Resource { value_resource_id } => {
                    (None, None, Some(*value_resource_id))
                }
            };
            value_stmt.execute(params![
                id,
                value.property_id,
                value.datatype,
                value.language,
                text,
                uri,
                value_resource_id,
                value.is_public as i32,
            ])?;
        }

        let mut attr_stmt = conn.prepare(
            "INSERT OR REPLACE INTO resource_attribute (resource_id, name, value) VALUES (?1, ?2, ?3)",
        )?;
        for (name, value) in &payload.extra {
            attr_stmt.execute(params![id, name, value])?;
        }

        Ok(CreatedResource {
            id,
            resource_type,
            created_at,
        })
    }
}

#[async_trait]
impl ResourceWriteRepository for ResourceWriteRepositoryImpl {
    async fn create_one(
        &self,
        resource_type: ResourceType,
        payload: ResourcePayload,
    ) -> RepositoryResult<CreatedResource> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.unchecked_transaction()?;

        let created = Self::insert_payload(&tx, resource_type, &payload)?;

        tx.commit()?;
        Ok(created)
    }

    async fn create_many(
        &self,
        resource_type: ResourceType,
        payloads: Vec<ResourcePayload>,
        options: BatchCreateOptions,
    ) -> RepositoryResult<Vec<CreatedResource>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut tx = conn.unchecked_transaction()?;

        let mut created = Vec::with_capacity(payloads.len());
        for (position, payload) in payloads.iter().enumerate() {
            let sp = tx.savepoint()?;
            let result = Self::insert_payload(&sp, resource_type, payload);
            match result {
                Ok(resource) => {
                    sp.commit()?;
                    created.push(resource);
                }
                Err(e) if options.continue_on_error => {
                    // savepoint 在 drop 时回滚
                    warn!(position = position + 1, error = %e, "批量创建中单条失败，继续处理");
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit()?;
        Ok(created)
    }

    async fn count_resources(&self, resource_type: Option<ResourceType>) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = match resource_type.and_then(|t| t.entity_name()) {
            Some(entity) => conn.query_row(
                "SELECT COUNT(*) FROM resource WHERE resource_type = ?1",
                params![entity],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM resource", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }
}
