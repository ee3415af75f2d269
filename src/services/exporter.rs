//! 结果导出服务 - 业务能力层
//!
//! 只负责"把结果行写成文件"，文件名为 `<原文件名>_processed.<扩展名>`

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::services::reader::SourceFormat;

const PROCESSED_SUFFIX: &str = "_processed";
/// Excel 单元格最多容纳的字符数
const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// 导出文件名
///
/// 只能写不含宏的 xlsx，因此 xlsm / xls / xlsb / ods 的导出扩展名改为 xlsx
pub fn processed_file_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let ext = match ext.to_ascii_lowercase().as_str() {
        "xlsm" | "xls" | "xlsb" | "ods" => "xlsx".to_string(),
        _ => ext,
    };

    if ext.is_empty() {
        format!("{}{}", stem, PROCESSED_SUFFIX)
    } else {
        format!("{}{}.{}", stem, PROCESSED_SUFFIX, ext)
    }
}

/// 写出结果行
///
/// # 参数
/// - `rows`: 结果行
/// - `source_file_name`: 源文件名（决定导出格式和文件名）
/// - `output_dir`: 导出目录
///
/// # 返回
/// 导出文件路径
pub fn export_rows(rows: &[Vec<String>], source_file_name: &str, output_dir: &Path) -> AppResult<PathBuf> {
    let format = SourceFormat::from_file_name(source_file_name)?;
    let path = output_dir.join(processed_file_name(source_file_name));
    debug!("导出 {} 行到 {}", rows.len(), path.display());

    match format {
        SourceFormat::Csv => write_delimited(rows, &path, b',')?,
        SourceFormat::Tsv | SourceFormat::PlainText => write_delimited(rows, &path, b'\t')?,
        SourceFormat::Spreadsheet => write_xlsx(rows, &path)?,
    }

    info!("💾 结果已写入: {}", path.display());
    Ok(path)
}

fn write_delimited(rows: &[Vec<String>], path: &Path, delimiter: u8) -> AppResult<()> {
    let fail = |e: csv::Error| AppError::export_failed(path.display().to_string(), e);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(fail)?;
    for row in rows {
        writer.write_record(row).map_err(fail)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::export_failed(path.display().to_string(), e))
}

fn write_xlsx(rows: &[Vec<String>], path: &Path) -> AppResult<()> {
    let fail = |e: rust_xlsxwriter::XlsxError| AppError::export_failed(path.display().to_string(), e);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (r, c) = match (u32::try_from(r), u16::try_from(c)) {
                (Ok(r), Ok(c)) => (r, c),
                _ => {
                    return Err(fail(rust_xlsxwriter::XlsxError::RowColumnLimitError));
                }
            };
            let text: String = value.chars().take(XLSX_MAX_CELL_CHARS).collect();
            worksheet.write_string(r, c, text).map_err(fail)?;
        }
    }

    workbook.save(path).map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::services::reader;

    #[test]
    fn test_processed_file_name() {
        assert_eq!(processed_file_name("data.csv"), "data_processed.csv");
        assert_eq!(processed_file_name("report.v2.xlsx"), "report.v2_processed.xlsx");
        assert_eq!(processed_file_name("old.xls"), "old_processed.xlsx");
        assert_eq!(processed_file_name("sheet.ods"), "sheet_processed.xlsx");
        assert_eq!(processed_file_name("a.xlsm"), "a_processed.xlsx");
        assert_eq!(processed_file_name("B.XLSM"), "B_processed.xlsx");
    }

    #[test]
    fn test_macro_workbook_exports_as_plain_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![vec!["x".to_string()]];

        let path = export_rows(&rows, "m.xlsm", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "m_processed.xlsx");

        let bytes = std::fs::read(&path).unwrap();
        let book = reader::parse(&bytes, "m_processed.xlsx", None).unwrap();
        assert_eq!(book.grid.cell(0, 0).unwrap().as_str(), "x");
    }

    #[test]
    fn test_export_csv_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            vec!["a, with comma".to_string(), "b".to_string()],
            vec!["c".to_string(), "[ERROR] X 返回结果为空".to_string()],
        ];

        let path = export_rows(&rows, "input.csv", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "input_processed.csv");

        let bytes = std::fs::read(&path).unwrap();
        let book = reader::parse(&bytes, "input_processed.csv", None).unwrap();
        assert_eq!(book.grid.cell(0, 0).unwrap().as_str(), "a, with comma");
        assert_eq!(book.grid.cell(1, 1).unwrap().as_str(), "[ERROR] X 返回结果为空");
    }

    #[test]
    fn test_export_xlsx_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            vec!["Describe alpha".to_string(), "Describe alpha".to_string()],
            vec!["Describe beta".to_string(), "Describe beta".to_string()],
        ];

        let path = export_rows(&rows, "input.xlsx", dir.path()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let book = reader::parse(&bytes, "input_processed.xlsx", None).unwrap();

        assert_eq!(book.grid.row_count(), 2);
        assert_eq!(book.grid.column_count(), 2);
        assert_eq!(book.grid.cell(1, 1).unwrap().as_str(), "Describe beta");
    }

    #[test]
    fn test_missing_directory_is_export_error() {
        let rows = vec![vec!["x".to_string()]];
        let err = export_rows(&rows, "a.csv", Path::new("/no/such/dir/anywhere")).unwrap_err();
        assert!(matches!(
            err,
            AppError::Export(ExportError::ExportWriteFailed { .. })
        ));
    }
}
