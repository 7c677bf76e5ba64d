// ==========================================
// 批量导入引擎 - 标识符查询 Repository 实现
// ==========================================
// 职责: 实现标识符候选行查询（使用 rusqlite）
// 约束: 所有查询使用参数化；IN 列表按块拆分
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::identifier::IdentifierMatch;
use crate::domain::types::ResourceType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::identifier_repo::IdentifierRepository;
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};

/// 单条语句 IN 列表的最大参数数
const MAX_IN_PARAMS: usize = 500;

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ==========================================
// IdentifierRepositoryImpl
// ==========================================
pub struct IdentifierRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl IdentifierRepositoryImpl {
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

    fn query_matches(
        conn: &Connection,
        sql: &str,
        params: Vec<Value>,
    ) -> RepositoryResult<Vec<IdentifierMatch>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok(IdentifierMatch {
                value: row.get(0)?,
                resource_id: row.get(1)?,
                row_id: row.get(2)?,
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }
        Ok(matches)
    }
}

#[async_trait]
impl IdentifierRepository for IdentifierRepositoryImpl {
    async fn find_existing_ids(
        &self,
        ids: &[i64],
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let entity = resource_type.and_then(|t| t.entity_name());

        let mut found = Vec::new();
        for chunk in ids.chunks(MAX_IN_PARAMS) {
            let mut sql = format!(
                "SELECT id FROM resource WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut params: Vec<Value> = chunk.iter().map(|id| Value::Integer(*id)).collect();
            if let Some(entity) = entity {
                sql.push_str(" AND resource_type = ?");
                params.push(Value::Text(entity.to_string()));
            }
            sql.push_str(" ORDER BY id ASC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?;
            for row in rows {
                found.push(row?);
            }
        }

        found.sort_unstable();
        Ok(found)
    }

    async fn find_property_values(
        &self,
        property_id: i64,
        values: &[String],
        resource_type: Option<ResourceType>,
    ) -> RepositoryResult<Vec<IdentifierMatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let entity = resource_type.and_then(|t| t.entity_name());

        let mut matches = Vec::new();
        for chunk in values.chunks(MAX_IN_PARAMS) {
            let mut sql = format!(
                r#"
                SELECT v.value, v.resource_id, v.id
                FROM value v
                JOIN resource r ON r.id = v.resource_id
                WHERE v.property_id = ?
                  AND v.value COLLATE NOCASE IN ({})
                "#,
                placeholders(chunk.len())
            );
            let mut params = vec![Value::Integer(property_id)];
            params.extend(chunk.iter().map(|v| Value::Text(v.clone())));
            if let Some(entity) = entity {
                sql.push_str(" AND r.resource_type = ?");
                params.push(Value::Text(entity.to_string()));
            }
            sql.push_str(" ORDER BY v.resource_id ASC, v.id ASC");

            matches.extend(Self::query_matches(&conn, &sql, params)?);
        }

        Ok(matches)
    }

    async fn find_media_sources(
        &self,
        ingester: &str,
        sources: &[String],
        item_id: Option<i64>,
    ) -> RepositoryResult<Vec<IdentifierMatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut matches = Vec::new();
        for chunk in sources.chunks(MAX_IN_PARAMS) {
            let mut sql = format!(
                r#"
                SELECT m.source, m.id, m.id
                FROM media m
                WHERE m.ingester = ?
                  AND m.source COLLATE NOCASE IN ({})
                "#,
                placeholders(chunk.len())
            );
            let mut params = vec![Value::Text(ingester.to_string())];
            params.extend(chunk.iter().map(|s| Value::Text(s.clone())));
            if let Some(item_id) = item_id {
                sql.push_str(" AND m.item_id = ?");
                params.push(Value::Integer(item_id));
            }
            sql.push_str(" ORDER BY m.id ASC");

            matches.extend(Self::query_matches(&conn, &sql, params)?);
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, seed_core_vocabulary};
    use rusqlite::params;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        seed_core_vocabulary(&conn).unwrap();
        for (id, kind) in [(3, "Item"), (5, "Item"), (7, "ItemSet")] {
            conn.execute(
                "INSERT INTO resource (id, resource_type, is_public, created) VALUES (?1, ?2, 1, '2024-01-01T00:00:00Z')",
                params![id, kind],
            )
            .unwrap();
        }
        for (resource_id, value) in [(5, "Foo"), (7, "foo"), (3, "Foo")] {
            conn.execute(
                "INSERT INTO value (resource_id, property_id, type, value) VALUES (?1, 10, 'literal', ?2)",
                params![resource_id, value],
            )
            .unwrap();
        }
        Arc::new(Mutex::new(conn))
    }

    #[tokio::test]
    async fn test_find_property_values_orders_by_resource_then_row() {
        let repo = IdentifierRepositoryImpl::from_connection(setup());
        let matches = repo
            .find_property_values(10, &["FOO".to_string()], None)
            .await
            .unwrap();

        let ids: Vec<i64> = matches.iter().map(|m| m.resource_id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[tokio::test]
    async fn test_find_property_values_filters_resource_type() {
        let repo = IdentifierRepositoryImpl::from_connection(setup());
        let matches = repo
            .find_property_values(10, &["foo".to_string()], Some(ResourceType::ItemSets))
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].resource_id, 7);
    }

    #[tokio::test]
    async fn test_find_existing_ids() {
        let repo = IdentifierRepositoryImpl::from_connection(setup());
        let ids = repo
            .find_existing_ids(&[7, 3, 99], Some(ResourceType::Items))
            .await
            .unwrap();
        assert_eq!(ids, vec![3]);

        let any = repo.find_existing_ids(&[7, 3, 99], None).await.unwrap();
        assert_eq!(any, vec![3, 7]);
    }
}
