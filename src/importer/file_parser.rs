// ==========================================
// 批量导入引擎 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 约定: 首行为表头；空白行保留为空条目（由导入管道计为跳过）；
//       单元格值原样保留，修剪与拆分由资源构建器负责
// ==========================================

use crate::importer::entry::{Entry, VecEntrySource};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 表头与一行单元格组装为条目（缺失单元格视为空值）
fn row_to_entry(headers: &[String], mut cells: impl Iterator<Item = String>) -> Entry {
    let mut entry = Entry::new();
    for header in headers {
        let value = cells.next().unwrap_or_default();
        if header.is_empty() {
            continue;
        }
        entry.insert(header.as_str(), value);
    }
    entry
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FileParser for CsvParser {
    fn parse_entries(&self, file_path: &Path) -> ImportResult<Vec<Entry>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" && ext != "tsv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(self.delimiter)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            entries.push(row_to_entry(
                &headers,
                record.iter().map(|v| v.to_string()),
            ));
        }

        debug!(file = %file_path.display(), rows = entries.len(), "CSV 解析完成");
        Ok(entries)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_entries(&self, file_path: &Path) -> ImportResult<Vec<Entry>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first().cloned() else {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        };
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let entries: Vec<Entry> = rows
            .map(|row| row_to_entry(&headers, row.iter().map(|cell| cell.to_string())))
            .collect();

        debug!(file = %file_path.display(), sheet = %sheet_name, rows = entries.len(), "Excel 解析完成");
        Ok(entries)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<Entry>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser::new().parse_entries(path),
            "tsv" => CsvParser::with_delimiter(b'\t').parse_entries(path),
            "xlsx" | "xls" => ExcelParser.parse_entries(path),
            ext => Err(ImportError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// 解析文件并包装为条目来源
    pub fn open<P: AsRef<Path>>(
        &self,
        file_path: P,
        separator: Option<String>,
    ) -> ImportResult<VecEntrySource> {
        let entries = self.parse(file_path)?;
        Ok(VecEntrySource::new(entries, separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = csv_file(&["Title, Identifier", "Moby Dick,B-1", "Emma,B-2"]);

        let entries = CsvParser::new().parse_entries(file.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get("Title"), Some("Moby Dick"));
        assert_eq!(entries[1].get("Identifier"), Some("B-2"));
    }

    #[test]
    fn test_csv_parser_keeps_blank_rows() {
        let file = csv_file(&["Title,Identifier", "Moby Dick,B-1", ",", "Emma,B-2"]);

        let entries = UniversalFileParser.parse(file.path()).unwrap();

        assert_eq!(entries.len(), 3);
        assert!(entries[1].is_empty());
    }

    #[test]
    fn test_csv_parser_short_row_fills_empty_values() {
        let file = csv_file(&["Title,Identifier,Creator", "Emma"]);

        let entries = CsvParser::new().parse_entries(file.path()).unwrap();

        assert_eq!(entries[0].get("Creator"), Some(""));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser::new().parse_entries(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = Builder::new().suffix(".json").tempfile().unwrap();
        let result = UniversalFileParser.parse(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
