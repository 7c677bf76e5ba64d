// ==========================================
// 批量导入引擎 - 导入运行模型
// ==========================================
// 职责: 运行计数器、运行阶段、运行汇总
// 约束: 计数器单调递增，作用域为单次运行
// ==========================================

use crate::domain::types::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RunCounters - 运行计数器
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub seen: usize,      // 已读取条目
    pub skipped: usize,   // 空条目
    pub processed: usize, // 已送写入
    pub errors: usize,    // 错误
}

// ==========================================
// RunPhase - 运行阶段
// ==========================================
// Init → Streaming → (Accumulating → Flushing)* → Finalizing → Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    Init,
    Streaming,
    Accumulating,
    Flushing,
    Finalizing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Init => write!(f, "INIT"),
            RunPhase::Streaming => write!(f, "STREAMING"),
            RunPhase::Accumulating => write!(f, "ACCUMULATING"),
            RunPhase::Flushing => write!(f, "FLUSHING"),
            RunPhase::Finalizing => write!(f, "FINALIZING"),
            RunPhase::Done => write!(f, "DONE"),
        }
    }
}

// ==========================================
// RunSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub resource_type: ResourceType,
    pub counters: RunCounters,
    pub created_ids: Vec<i64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}
