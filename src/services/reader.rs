//! 表格读取服务 - 业务能力层
//!
//! 只负责"把上传的文件变成网格"：
//! - 分隔文本（csv / tsv）：每行一行，按分隔符切分，只跳过完全空白的行
//!   （只有分隔符的行保留为空行，行号与原文件一致）
//! - 纯文本（txt）：每个非空行是只有一列的一行
//! - 表格文件（xlsx / xls / ods ...）：默认读取第一个工作表，并返回全部工作表名

use calamine::{Data, Range, Reader};
use phf::phf_map;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult, SourceError};
use crate::models::grid::{Cell, SourceGrid};

/// 支持的源文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    PlainText,
    /// 单工作表或多工作表的表格文件
    Spreadsheet,
}

static FORMATS: phf::Map<&'static str, SourceFormat> = phf_map! {
    "csv" => SourceFormat::Csv,
    "tsv" => SourceFormat::Tsv,
    "txt" => SourceFormat::PlainText,
    "xlsx" => SourceFormat::Spreadsheet,
    "xlsm" => SourceFormat::Spreadsheet,
    "xlsb" => SourceFormat::Spreadsheet,
    "xls" => SourceFormat::Spreadsheet,
    "ods" => SourceFormat::Spreadsheet,
};

impl SourceFormat {
    /// 根据文件扩展名识别格式（不区分大小写）
    pub fn from_file_name(file_name: &str) -> AppResult<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| FORMATS.get(ext.to_ascii_lowercase().as_str()).copied())
            .ok_or_else(|| AppError::unsupported_format(file_name))
    }

    pub fn has_sheets(self) -> bool {
        self == SourceFormat::Spreadsheet
    }
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct SourceWorkbook {
    pub file_name: String,
    pub format: SourceFormat,
    /// 全部工作表名（非表格格式为空）
    pub sheet_names: Vec<String>,
    /// 当前读取的工作表
    pub active_sheet: Option<String>,
    pub grid: SourceGrid,
}

/// 读取文件内容
pub async fn read_bytes(path: &Path) -> AppResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        SourceError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        }
        .into()
    })
}

/// 解析文件
///
/// # 参数
/// - `bytes`: 文件内容
/// - `file_name`: 文件名（用于识别格式）
/// - `sheet`: 工作表名，`None` 时取第一个
pub fn parse(bytes: &[u8], file_name: &str, sheet: Option<&str>) -> AppResult<SourceWorkbook> {
    let format = SourceFormat::from_file_name(file_name)?;
    debug!("解析文件 {} ({:?}, {} 字节)", file_name, format, bytes.len());

    let (grid, sheet_names, active_sheet) = match format {
        SourceFormat::Csv => (parse_delimited(bytes, b',', file_name)?, Vec::new(), None),
        SourceFormat::Tsv => (parse_delimited(bytes, b'\t', file_name)?, Vec::new(), None),
        SourceFormat::PlainText => (parse_plain_text(bytes, file_name)?, Vec::new(), None),
        SourceFormat::Spreadsheet => {
            let (grid, names, active) = parse_spreadsheet(bytes, file_name, sheet)?;
            (grid, names, Some(active))
        }
    };

    Ok(SourceWorkbook {
        file_name: file_name.to_string(),
        format,
        sheet_names,
        active_sheet,
        grid,
    })
}

/// 列出工作表名；非表格格式返回空列表
pub fn list_sheets(bytes: &[u8], file_name: &str) -> AppResult<Vec<String>> {
    if !SourceFormat::from_file_name(file_name)?.has_sheets() {
        return Ok(Vec::new());
    }
    let workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::parse_failed(file_name, e))?;
    Ok(workbook.sheet_names())
}

fn parse_delimited(bytes: &[u8], delimiter: u8, file_name: &str) -> AppResult<SourceGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::parse_failed(file_name, e))?;
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(SourceGrid::from_rows(rows))
}

fn parse_plain_text(bytes: &[u8], file_name: &str) -> AppResult<SourceGrid> {
    let text = std::str::from_utf8(bytes).map_err(|e| AppError::parse_failed(file_name, e))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let rows = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| vec![Cell::from(line)])
        .collect();

    Ok(SourceGrid::from_rows(rows))
}

fn parse_spreadsheet(
    bytes: &[u8],
    file_name: &str,
    sheet: Option<&str>,
) -> AppResult<(SourceGrid, Vec<String>, String)> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::parse_failed(file_name, e))?;

    let sheet_names = workbook.sheet_names();
    let active = match sheet {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            return Err(SourceError::SheetNotFound {
                sheet: name.to_string(),
                available: sheet_names,
            }
            .into())
        }
        None => match sheet_names.first() {
            Some(first) => first.clone(),
            None => return Ok((SourceGrid::default(), sheet_names, String::new())),
        },
    };

    let range = workbook
        .worksheet_range(&active)
        .map_err(|e| AppError::parse_failed(file_name, e))?;

    Ok((range_to_grid(&range), sheet_names, active))
}

/// 把工作表区域转成网格
///
/// 区域不从 A1 开始时在前面补空行/空列，保证行列标签与表格软件一致
fn range_to_grid(range: &Range<Data>) -> SourceGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(|data| Cell::new(data_to_string(data))));
        rows.push(cells);
    }

    SourceGrid::from_rows(rows)
}

fn data_to_string(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Error(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_file_name("a.CSV").unwrap(), SourceFormat::Csv);
        assert_eq!(
            SourceFormat::from_file_name("report.final.xlsx").unwrap(),
            SourceFormat::Spreadsheet
        );
        assert!(matches!(
            SourceFormat::from_file_name("slides.pdf"),
            Err(AppError::Source(SourceError::UnsupportedFormat { .. }))
        ));
        assert!(SourceFormat::from_file_name("noext").is_err());
    }

    #[test]
    fn test_csv_skips_empty_lines_and_pads() {
        let data = b"name,city\n\nalpha,Tokyo,extra\nbeta\n";
        let book = parse(data, "list.csv", None).unwrap();

        assert_eq!(book.grid.row_count(), 3);
        assert_eq!(book.grid.column_count(), 3);
        assert!(book.grid.rows().iter().all(|r| r.len() == 3));
        assert_eq!(book.grid.cell(2, 0).map(Cell::as_str), Some("beta"));
        assert_eq!(book.grid.cell(2, 1), Some(&Cell::Empty));
        assert!(book.sheet_names.is_empty());
        assert!(book.active_sheet.is_none());
    }

    #[test]
    fn test_tsv_uses_tab_delimiter() {
        let book = parse(b"a\tb, c\n", "x.tsv", None).unwrap();
        assert_eq!(book.grid.column_count(), 2);
        assert_eq!(book.grid.cell(0, 1).map(Cell::as_str), Some("b, c"));
    }

    #[test]
    fn test_plain_text_one_cell_per_line() {
        let book = parse("\u{feff}alpha\r\n\r\nbeta, gamma\n".as_bytes(), "q.txt", None).unwrap();
        assert_eq!(book.grid.row_count(), 2);
        assert_eq!(book.grid.column_count(), 1);
        assert_eq!(book.grid.cell(1, 0).map(Cell::as_str), Some("beta, gamma"));
    }

    #[test]
    fn test_invalid_utf8_text_is_parse_error() {
        let err = parse(&[0xff, 0xfe, 0x00], "bad.txt", None).unwrap_err();
        assert!(matches!(err, AppError::Source(SourceError::ParseError { .. })));
    }

    #[test]
    fn test_garbage_spreadsheet_is_parse_error() {
        let err = parse(b"this is not a zip", "broken.xlsx", None).unwrap_err();
        assert!(matches!(err, AppError::Source(SourceError::ParseError { .. })));
    }

    #[test]
    fn test_separator_only_line_keeps_row_position() {
        let book = parse(b"a,b\n,\nc,d\n", "x.csv", None).unwrap();
        assert_eq!(book.grid.row_count(), 3);
        assert!(book.grid.row(1).unwrap().iter().all(Cell::is_empty));
        assert_eq!(book.grid.cell(2, 0).map(Cell::as_str), Some("c"));
    }

    fn two_sheet_workbook() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let first = workbook.add_worksheet().set_name("One").unwrap();
        first.write_string(0, 0, "x").unwrap();
        let second = workbook.add_worksheet().set_name("Two").unwrap();
        second.write_string(2, 1, "y").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_list_sheets_for_workbook() {
        let bytes = two_sheet_workbook();
        assert_eq!(list_sheets(&bytes, "book.xlsx").unwrap(), vec!["One", "Two"]);
    }

    #[test]
    fn test_list_sheets_garbage_workbook_is_parse_error() {
        let err = list_sheets(b"this is not a zip", "broken.xlsx").unwrap_err();
        assert!(matches!(err, AppError::Source(SourceError::ParseError { .. })));
    }

    #[test]
    fn test_named_sheet_keeps_cell_positions() {
        let bytes = two_sheet_workbook();
        let book = parse(&bytes, "book.xlsx", Some("Two")).unwrap();
        assert_eq!(book.active_sheet.as_deref(), Some("Two"));
        assert_eq!(book.sheet_names, vec!["One", "Two"]);
        assert_eq!(book.grid.cell(2, 1).map(Cell::as_str), Some("y"));

        let err = parse(&bytes, "book.xlsx", Some("Three")).unwrap_err();
        assert!(matches!(err, AppError::Source(SourceError::SheetNotFound { .. })));
    }

    #[test]
    fn test_list_sheets_for_text_formats_is_empty() {
        assert!(list_sheets(b"a,b", "a.csv").unwrap().is_empty());
    }

    #[test]
    fn test_data_to_string() {
        assert_eq!(data_to_string(&Data::Float(3.0)), "3");
        assert_eq!(data_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(data_to_string(&Data::Int(7)), "7");
        assert_eq!(data_to_string(&Data::Empty), "");
    }
}
