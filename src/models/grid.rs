//! 表格数据模型
//!
//! 上传文件解析后得到的矩形单元格网格

/// 单元格值
///
/// 读取阶段统一归一化：空字符串与缺失单元格都是 `Empty`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
}

impl Cell {
    /// 从任意字符串创建单元格，空串视为 `Empty`
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// 单元格文本，`Empty` 返回空串
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Empty => "",
            Cell::Text(s) => s,
        }
    }

    /// 是否为空（只含空白也算空）
    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::new(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::new(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::new).unwrap_or_default()
    }
}

/// 矩形网格
///
/// 所有行的列数相同：短行在末尾补 `Empty`，不会截断任何行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl SourceGrid {
    /// 从不规则的行构建网格，并按最长行补齐
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in rows.iter_mut() {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    /// 从字符串行构建网格
    pub fn from_strings<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| Cell::new(s)).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// 按列从上到下遍历
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}
