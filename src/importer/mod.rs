// ==========================================
// 批量导入引擎 - 导入层
// ==========================================
// 职责: 源文件 → 条目 → 资源草稿 → 按批写入
// 流程: 解析 → 映射编译 → 构建 → 唯一性检查 → 分批提交
// ==========================================

pub mod batch_importer;
pub mod entry;
pub mod error;
pub mod file_parser;
pub mod identity_checker;
pub mod importer_trait;
pub mod mapping_compiler;
pub mod resource_builder;

pub use batch_importer::BatchImporter;
pub use entry::{Entry, VecEntrySource};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use identity_checker::IdentityChecker;
pub use importer_trait::{BulkImporter, EntrySource, FileParser};
pub use mapping_compiler::{split_nested_target, MappingCompiler};
pub use resource_builder::{parse_visibility, split_values, BuildOutcome, ResourceBuilder};
