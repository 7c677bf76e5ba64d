// ==========================================
// 批量导入引擎 - API 层
// ==========================================
// 职责: 对外接口（CLI 与嵌入调用方），组装仓储与导入管道
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
