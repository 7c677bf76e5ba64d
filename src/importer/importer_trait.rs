// ==========================================
// 批量导入引擎 - 导入层 Trait
// ==========================================
// 职责: 定义条目来源、文件解析、批量导入接口（不包含实现）
// ==========================================

use crate::domain::run::RunSummary;
use crate::importer::entry::Entry;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// EntrySource Trait
// ==========================================
// 用途: 按源顺序逐条产出条目
// 实现者: VecEntrySource
pub trait EntrySource: Send {
    /// 多值分隔符（None 表示单值）
    fn separator(&self) -> Option<&str>;

    /// 下一个条目（来源耗尽返回 None）
    fn next_entry(&mut self) -> Option<Entry>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件 → 条目列表
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为条目（保留空白行，由导入管道计为跳过）
    ///
    /// # 返回
    /// - Ok(Vec<Entry>): 按文件顺序
    /// - Err: 文件读取错误、格式错误
    fn parse_entries(&self, file_path: &Path) -> ImportResult<Vec<Entry>>;
}

// ==========================================
// BulkImporter Trait
// ==========================================
// 用途: 单次导入运行
// 实现者: BatchImporter
#[async_trait]
pub trait BulkImporter: Send + Sync {
    /// 从条目来源执行一次导入运行
    ///
    /// # 返回
    /// - Ok(RunSummary): 四个计数器 + 已创建资源 id
    /// - Err: 配置级失败（运行未开始处理条目）
    async fn run(&self, source: &mut dyn EntrySource) -> ImportResult<RunSummary>;

    /// 从文件执行一次导入运行（按扩展名选择解析器）
    async fn import_file(&self, file_path: &Path) -> ImportResult<RunSummary>;

    /// 依次导入多个文件（严格按顺序，互不影响）
    async fn import_files(&self, file_paths: Vec<std::path::PathBuf>) -> Vec<ImportResult<RunSummary>>;
}
