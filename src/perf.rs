// ==========================================
// 批量导入引擎 - 性能统计
// ==========================================
// 职责: SQLite 语句计数与慢 SQL 日志；导入运行的耗时、批次数、吞吐量
// 计数为进程级（导入运行在 tokio 任务间迁移，不能用线程局部计数）
// 开关:
// - BULK_IMPORT_PERF_SQL=1/0 强制开关语句统计（默认 Debug 开、Release 关）
// - BULK_IMPORT_SLOW_SQL_MS=50 慢 SQL 阈值（毫秒）
// ==========================================

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static SQL_STATS_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);
static STATEMENTS: AtomicU64 = AtomicU64::new(0);
static SLOW_STATEMENTS: AtomicU64 = AtomicU64::new(0);

const SLOW_SQL_LOG_CHARS: usize = 420;

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 压成单行并按字符截断
fn one_line(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 在连接上挂接语句统计（db::open_sqlite_connection 调用）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = env_flag("BULK_IMPORT_PERF_SQL").unwrap_or(cfg!(debug_assertions));
    SQL_STATS_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let threshold = std::env::var("BULK_IMPORT_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_MS.store(threshold, Ordering::Relaxed);

    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_done));
}

fn on_statement(_sql: &str) {
    if SQL_STATS_ENABLED.load(Ordering::Relaxed) {
        STATEMENTS.fetch_add(1, Ordering::Relaxed);
    }
}

fn on_statement_done(sql: &str, duration: Duration) {
    if !SQL_STATS_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let ms = duration.as_millis() as u64;
    if threshold == 0 || ms < threshold {
        return;
    }
    SLOW_STATEMENTS.fetch_add(1, Ordering::Relaxed);
    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %one_line(sql, SLOW_SQL_LOG_CHARS),
        "慢 SQL"
    );
}

// ==========================================
// SqlStats - 语句计数快照
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlStats {
    pub statements: u64,
    pub slow_statements: u64,
}

impl SqlStats {
    pub fn snapshot() -> Self {
        Self {
            statements: STATEMENTS.load(Ordering::Relaxed),
            slow_statements: SLOW_STATEMENTS.load(Ordering::Relaxed),
        }
    }

    /// 相对更早快照的增量（并发运行时为进程内合计）
    pub fn since(&self, earlier: &SqlStats) -> SqlStats {
        SqlStats {
            statements: self.statements.saturating_sub(earlier.statements),
            slow_statements: self.slow_statements.saturating_sub(earlier.slow_statements),
        }
    }
}

// ==========================================
// PerfGuard - 导入运行统计
// ==========================================
// drop 时输出: 耗时、条目数、批次数、吞吐量、SQL 语句数
pub struct PerfGuard {
    op: &'static str,
    label: String,
    start: Instant,
    sql_start: SqlStats,
    entries: usize,
    flushes: usize,
}

impl PerfGuard {
    pub fn new(op: &'static str, label: impl Into<String>) -> Self {
        Self {
            op,
            label: label.into(),
            start: Instant::now(),
            sql_start: SqlStats::snapshot(),
            entries: 0,
            flushes: 0,
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }

    pub fn record_entries(&mut self, entries: usize) {
        self.entries = entries;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    /// 每秒条目数（耗时不足 1ms 按 1ms 计）
    pub fn entries_per_sec(&self) -> f64 {
        let ms = self.elapsed_ms().max(1) as f64;
        self.entries as f64 * 1000.0 / ms
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let sql = SqlStats::snapshot().since(&self.sql_start);
        tracing::info!(
            target: "perf",
            op = self.op,
            label = %self.label,
            elapsed_ms = self.elapsed_ms(),
            entries = self.entries,
            flushes = self.flushes,
            entries_per_sec = self.entries_per_sec(),
            sql_count = sql.statements,
            slow_sql_count = sql.slow_statements,
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_flattens_and_truncates_on_char_boundary() {
        assert_eq!(one_line("SELECT 1", 20), "SELECT 1");
        assert_eq!(one_line("SELECT id\n  FROM value", 40), "SELECT id FROM value");
        assert_eq!(one_line("SELECT '条目集'", 9), "SELECT '条…");
    }

    #[test]
    fn test_sql_stats_delta_saturates() {
        let later = SqlStats {
            statements: 10,
            slow_statements: 1,
        };
        let earlier = SqlStats {
            statements: 4,
            slow_statements: 3,
        };
        assert_eq!(
            later.since(&earlier),
            SqlStats {
                statements: 6,
                slow_statements: 0
            }
        );
    }

    #[test]
    fn test_perf_guard_counts_flushes() {
        let mut guard = PerfGuard::new("test", "run");
        guard.record_entries(40);
        guard.record_flush();
        guard.record_flush();
        assert_eq!(guard.flushes, 2);
        assert!(guard.entries_per_sec() > 0.0);
    }
}
