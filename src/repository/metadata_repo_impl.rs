// ==========================================
// 批量导入引擎 - 元数据查询 Repository 实现
// ==========================================
// 职责: 实现词表/模板/类/用户查询（使用 rusqlite）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::metadata_repo::MetadataRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// MetadataRepositoryImpl
// ==========================================
pub struct MetadataRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl MetadataRepositoryImpl {
    /// 创建新的 Repository 实例
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

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 id 检查存在性
    fn exists_by_id(conn: &Connection, table: &str, id: i64) -> RepositoryResult<Option<i64>> {
        let sql = format!("SELECT id FROM {} WHERE id = ?1", table);
        Ok(conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()?)
    }

    /// 按术语（prefix:local_name）查询词表成员
    fn find_by_term(conn: &Connection, table: &str, term: &str) -> RepositoryResult<Option<i64>> {
        let Some((prefix, local_name)) = term.split_once(':') else {
            return Ok(None);
        };
        let sql = format!(
            r#"
            SELECT t.id FROM {} t
            JOIN vocabulary v ON v.id = t.vocabulary_id
            WHERE v.prefix = ?1 AND t.local_name = ?2
            "#,
            table
        );
        Ok(conn
            .query_row(&sql, params![prefix.trim(), local_name.trim()], |row| row.get(0))
            .optional()?)
    }
}

#[async_trait]
impl MetadataRepository for MetadataRepositoryImpl {
    async fn find_property_id(&self, term: &str) -> RepositoryResult<Option<i64>> {
        let term = term.trim();
        let conn = self.lock()?;
        match term.parse::<i64>() {
            Ok(id) => Self::exists_by_id(&conn, "property", id),
            Err(_) => Self::find_by_term(&conn, "property", term),
        }
    }

    async fn get_property_term(&self, property_id: i64) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                r#"
                SELECT v.prefix || ':' || p.local_name
                FROM property p
                JOIN vocabulary v ON v.id = p.vocabulary_id
                WHERE p.id = ?1
                "#,
                params![property_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    async fn find_resource_template_id(&self, value: &str) -> RepositoryResult<Option<i64>> {
        let value = value.trim();
        let conn = self.lock()?;
        match value.parse::<i64>() {
            Ok(id) => Self::exists_by_id(&conn, "resource_template", id),
            Err(_) => Ok(conn
                .query_row(
                    "SELECT id FROM resource_template WHERE label = ?1",
                    params![value],
                    |row| row.get(0),
                )
                .optional()?),
        }
    }

    async fn find_resource_class_id(&self, value: &str) -> RepositoryResult<Option<i64>> {
        let value = value.trim();
        let conn = self.lock()?;
        match value.parse::<i64>() {
            Ok(id) => Self::exists_by_id(&conn, "resource_class", id),
            Err(_) => Self::find_by_term(&conn, "resource_class", value),
        }
    }

    async fn find_user_id(&self, value: &str) -> RepositoryResult<Option<i64>> {
        let value = value.trim();
        let conn = self.lock()?;
        if let Ok(id) = value.parse::<i64>() {
            return Self::exists_by_id(&conn, "user", id);
        }
        Ok(conn
            .query_row(
                "SELECT id FROM user WHERE email = ?1 COLLATE NOCASE OR name = ?1 ORDER BY id LIMIT 1",
                params![value],
                |row| row.get(0),
            )
            .optional()?)
    }
}
