// ==========================================
// 批量导入引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供目标仓库 schema 与核心词表种子数据
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 初始化目标仓库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS vocabulary (
            id INTEGER PRIMARY KEY,
            prefix TEXT NOT NULL UNIQUE,
            namespace_uri TEXT NOT NULL,
            label TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS property (
            id INTEGER PRIMARY KEY,
            vocabulary_id INTEGER NOT NULL REFERENCES vocabulary(id),
            local_name TEXT NOT NULL,
            label TEXT NOT NULL,
            UNIQUE (vocabulary_id, local_name)
        );

        CREATE TABLE IF NOT EXISTS resource_class (
            id INTEGER PRIMARY KEY,
            vocabulary_id INTEGER NOT NULL REFERENCES vocabulary(id),
            local_name TEXT NOT NULL,
            label TEXT NOT NULL,
            UNIQUE (vocabulary_id, local_name)
        );

        CREATE TABLE IF NOT EXISTS resource_template (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS resource (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_type TEXT NOT NULL,
            owner_id INTEGER REFERENCES user(id),
            resource_class_id INTEGER REFERENCES resource_class(id),
            resource_template_id INTEGER REFERENCES resource_template(id),
            is_public INTEGER NOT NULL DEFAULT 1,
            created TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS item_item_set (
            item_id INTEGER NOT NULL REFERENCES resource(id) ON DELETE CASCADE,
            item_set_id INTEGER NOT NULL REFERENCES resource(id) ON DELETE CASCADE,
            PRIMARY KEY (item_id, item_set_id)
        );

        CREATE TABLE IF NOT EXISTS media (
            id INTEGER PRIMARY KEY REFERENCES resource(id) ON DELETE CASCADE,
            item_id INTEGER REFERENCES resource(id) ON DELETE CASCADE,
            ingester TEXT NOT NULL,
            source TEXT
        );

        CREATE TABLE IF NOT EXISTS value (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_id INTEGER NOT NULL REFERENCES resource(id) ON DELETE CASCADE,
            property_id INTEGER NOT NULL REFERENCES property(id),
            type TEXT NOT NULL,
            lang TEXT,
            value TEXT,
            uri TEXT,
            value_resource_id INTEGER REFERENCES resource(id) ON DELETE CASCADE,
            is_public INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS resource_attribute (
            resource_id INTEGER NOT NULL REFERENCES resource(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (resource_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_value_property_value ON value (property_id, value);
        CREATE INDEX IF NOT EXISTS idx_media_ingester_source ON media (ingester, source);
        CREATE INDEX IF NOT EXISTS idx_resource_type ON resource (resource_type);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 写入核心词表（Dublin Core Terms）种子数据（幂等）
pub fn seed_core_vocabulary(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT OR IGNORE INTO vocabulary (id, prefix, namespace_uri, label)
        VALUES (1, 'dcterms', 'http://purl.org/dc/terms/', 'Dublin Core')
        "#,
        [],
    )?;

    let properties = [
        (1, "title", "Title"),
        (2, "creator", "Creator"),
        (3, "subject", "Subject"),
        (4, "description", "Description"),
        (5, "date", "Date"),
        (6, "source", "Source"),
        (7, "relation", "Relation"),
        (10, "identifier", "Identifier"),
    ];
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO property (id, vocabulary_id, local_name, label) VALUES (?1, 1, ?2, ?3)",
    )?;
    for (id, local_name, label) in properties {
        stmt.execute(rusqlite::params![id, local_name, label])?;
    }

    Ok(())
}

/// 默认数据库路径
///
/// 优先级: BULK_IMPORT_DB_PATH 环境变量 → 用户数据目录/bulk-import/bulk_import.db → ./bulk_import.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("BULK_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("bulk-import");
            if std::fs::create_dir_all(&dir).is_ok() {
                return dir.join("bulk_import.db").to_string_lossy().to_string();
            }
            "./bulk_import.db".to_string()
        }
        None => "./bulk_import.db".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        seed_core_vocabulary(&conn).unwrap();
        seed_core_vocabulary(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM property", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 8);
    }

    #[test]
    fn test_default_db_path_ends_with_db() {
        assert!(get_default_db_path().ends_with(".db"));
    }
}
