//! 行列标签与输入值解析
//!
//! 列标签使用表格软件的字母编号（A..Z, AA..），行标签是从 1 开始的数字

use regex::Regex;

use crate::error::{AppResult, PipelineError};
use crate::models::grid::{Cell, SourceGrid};
use crate::models::selection::{HeaderKind, HeaderSelection};

const COLUMN_LABEL: &str = r"^[A-Za-z]+$";
const ROW_LABEL: &str = r"^[1-9][0-9]*$";

/// 第 `index` 列（0-based）的字母标签
pub fn column_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// 前 `count` 列的标签
pub fn label_columns(count: usize) -> Vec<String> {
    (0..count).map(column_label).collect()
}

/// 前 `count` 行的标签（"1".."count"）
pub fn label_rows(count: usize) -> Vec<String> {
    (1..=count).map(|i| i.to_string()).collect()
}

/// 把标签解析为 0-based 索引
pub fn parse_label(label: &str, kind: HeaderKind) -> AppResult<usize> {
    let label = label.trim();
    let invalid = || PipelineError::InvalidLabel {
        label: label.to_string(),
        kind: kind.name().to_string(),
    };

    let pattern = match kind {
        HeaderKind::Col => COLUMN_LABEL,
        HeaderKind::Row => ROW_LABEL,
    };
    let re = Regex::new(pattern).map_err(|_| invalid())?;
    if !re.is_match(label) {
        return Err(invalid().into());
    }

    match kind {
        HeaderKind::Col => {
            let mut index: usize = 0;
            for b in label.to_ascii_uppercase().bytes() {
                index = index
                    .checked_mul(26)
                    .and_then(|v| v.checked_add((b - b'A' + 1) as usize))
                    .ok_or_else(invalid)?;
            }
            Ok(index - 1)
        }
        HeaderKind::Row => {
            let number: usize = label.parse().map_err(|_| invalid())?;
            Ok(number - 1)
        }
    }
}

/// 根据标签创建选择，并检查是否在网格范围内
pub fn select_header(grid: &SourceGrid, label: &str, kind: HeaderKind) -> AppResult<HeaderSelection> {
    let index = parse_label(label, kind)?;
    let max = match kind {
        HeaderKind::Col => grid.column_count(),
        HeaderKind::Row => grid.row_count(),
    };
    if index >= max {
        return Err(PipelineError::LabelOutOfRange {
            label: label.trim().to_string(),
            kind: kind.name().to_string(),
            max,
        }
        .into());
    }

    Ok(HeaderSelection {
        kind,
        index,
        label: label.trim().to_ascii_uppercase(),
    })
}

/// 取出所选行或列的非空值
///
/// 列：从上到下；行：从左到右
pub fn resolve_selected_values(
    grid: &SourceGrid,
    selection: Option<&HeaderSelection>,
) -> AppResult<Vec<String>> {
    let selection = selection.ok_or(PipelineError::NoSelection)?;

    let values = match selection.kind {
        HeaderKind::Col => grid
            .column(selection.index)
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.as_str().to_string())
            .collect(),
        HeaderKind::Row => grid
            .row(selection.index)
            .unwrap_or_default()
            .iter()
            .filter(|cell| !cell.is_empty())
            .map(Cell::as_str)
            .map(str::to_string)
            .collect(),
    };

    Ok(values)
}
