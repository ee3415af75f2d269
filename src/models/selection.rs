use serde::{Deserialize, Serialize};
use std::fmt;

/// 表头类型：行或列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderKind {
    Row,
    Col,
}

impl HeaderKind {
    /// 中文名称（用于日志和错误信息）
    pub fn name(self) -> &'static str {
        match self {
            HeaderKind::Row => "行",
            HeaderKind::Col => "列",
        }
    }
}

/// 当前选中的行或列
///
/// 同一时间最多一个，选列会替换之前选的行，反之亦然
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSelection {
    pub kind: HeaderKind,
    /// 0-based 索引
    pub index: usize,
    /// 用户看到的标签（"B" / "3"）
    pub label: String,
}

impl fmt::Display for HeaderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.label)
    }
}
