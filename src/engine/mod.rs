// ==========================================
// 批量导入引擎 - 引擎层
// ==========================================
// 职责: 标识符解析规则（规范化、短路、平局裁决），不拼 SQL
// ==========================================

pub mod identifier_resolver;

pub use identifier_resolver::{pick_matches, IdentifierResolver, NormalizedIdentifier};
