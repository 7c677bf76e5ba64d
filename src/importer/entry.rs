// ==========================================
// 批量导入引擎 - 条目与条目来源
// ==========================================
// 职责: 规范化源行（源字段 → 值），内存条目来源
// ==========================================

use crate::importer::importer_trait::EntrySource;
use std::collections::VecDeque;

// ==========================================
// Entry - 单个源行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (字段, 值) 对创建（同名字段后者覆盖前者）
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entry = Self::new();
        for (k, v) in pairs {
            entry.insert(k, v);
        }
        entry
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, field: K, value: V) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    /// 所有值均为空白即视为空条目
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

// ==========================================
// VecEntrySource - 内存条目来源
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VecEntrySource {
    entries: VecDeque<Entry>,
    separator: Option<String>,
}

impl VecEntrySource {
    pub fn new(entries: Vec<Entry>, separator: Option<String>) -> Self {
        Self {
            entries: entries.into(),
            separator: separator.filter(|s| !s.is_empty()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl EntrySource for VecEntrySource {
    fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    fn next_entry(&mut self) -> Option<Entry> {
        self.entries.pop_front()
    }
}
