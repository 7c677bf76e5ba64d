// ==========================================
// 批量导入引擎 - 导入 API
// ==========================================
// 职责: 组装仓储与导入管道，对外提供文件导入、方案管理、资源统计
// 约束: 所有仓储共享同一连接
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportRunConfig};
use crate::db::{init_schema, open_sqlite_connection, seed_core_vocabulary};
use crate::domain::run::RunSummary;
use crate::domain::types::ResourceType;
use crate::importer::{BatchImporter, BulkImporter};
use crate::repository::{
    IdentifierRepositoryImpl, MetadataRepositoryImpl, ResourceWriteRepository,
    ResourceWriteRepositoryImpl,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
    config_manager: ConfigManager,
}

impl ImportApi {
    /// 打开数据库（建表 + 核心词表种子，均幂等）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        seed_core_vocabulary(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        info!(db_path = %db_path, "数据库已就绪");
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            config_manager: ConfigManager::from_connection(conn.clone()),
            conn,
        }
    }

    fn importer(&self, config: ImportRunConfig) -> BatchImporter {
        BatchImporter::new(
            config,
            Arc::new(MetadataRepositoryImpl::from_connection(self.conn.clone())),
            Arc::new(IdentifierRepositoryImpl::from_connection(self.conn.clone())),
            Arc::new(ResourceWriteRepositoryImpl::from_connection(self.conn.clone())),
        )
    }

    /// 导入单个文件
    pub async fn import_file(&self, config: ImportRunConfig, file_path: &str) -> ApiResult<RunSummary> {
        let path = validate_file_path(file_path)?;
        Ok(self.importer(config).import_file(&path).await?)
    }

    /// 依次导入多个文件（单个文件失败不影响后续文件）
    pub async fn import_files(
        &self,
        config: ImportRunConfig,
        file_paths: &[String],
    ) -> ApiResult<Vec<Result<RunSummary, String>>> {
        if file_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        // 文件是否存在由逐文件导入判定
        let paths: Vec<PathBuf> = file_paths.iter().map(|p| PathBuf::from(p.trim())).collect();

        let results = self.importer(config).import_files(paths).await;
        Ok(results
            .into_iter()
            .map(|r| r.map_err(|e| ApiError::from(e).to_string()))
            .collect())
    }

    /// 按已保存的方案导入
    pub async fn import_with_profile(
        &self,
        profile_name: &str,
        file_path: &str,
        current_user_id: Option<i64>,
    ) -> ApiResult<RunSummary> {
        let mut config = self
            .config_manager
            .get_import_profile(profile_name)?
            .ok_or_else(|| ApiError::NotFound(format!("导入方案 {}", profile_name)))?;
        if current_user_id.is_some() {
            config.current_user_id = current_user_id;
        }
        self.import_file(config, file_path).await
    }

    /// 保存导入方案（保存前校验）
    pub fn save_profile(&self, profile_name: &str, config: &ImportRunConfig) -> ApiResult<()> {
        if profile_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("方案名称不能为空".to_string()));
        }
        if config.entries_by_batch == 0 {
            return Err(ApiError::InvalidInput("批大小必须大于 0".to_string()));
        }
        self.config_manager.save_import_profile(profile_name, config)?;
        Ok(())
    }

    pub fn list_profiles(&self) -> ApiResult<Vec<String>> {
        Ok(self.config_manager.list_import_profiles()?)
    }

    /// 统计资源数量（类型名称支持别名；None 表示全部）
    pub async fn count_resources(&self, resource_type: Option<&str>) -> ApiResult<usize> {
        let resource_type = match resource_type {
            Some(name) => Some(
                ResourceType::parse(name)
                    .ok_or_else(|| ApiError::InvalidInput(format!("未知资源类型: {}", name)))?,
            ),
            None => None,
        };
        let repo = ResourceWriteRepositoryImpl::from_connection(self.conn.clone());
        Ok(repo.count_resources(resource_type).await?)
    }
}

fn validate_file_path(file_path: &str) -> ApiResult<PathBuf> {
    let trimmed = file_path.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.exists() {
        return Err(ApiError::NotFound(format!("文件 {}", trimmed)));
    }
    Ok(path.to_path_buf())
}
