//! 批处理日志
//!
//! 每次批处理生成一条，只保存在会话内存中

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use super::target::LlmResponse;

/// 一条提示词记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    /// 原始模板
    pub original: String,
    /// 该模板的改写
    pub variations: Vec<String>,
    /// 代入源值后的提示词
    pub processed: String,
}

/// 批处理结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// 中途取消，只包含已完成的行
    Cancelled,
}

/// 批处理日志
#[derive(Debug, Clone)]
pub struct BatchLog {
    /// 生成时间戳（毫秒）
    pub id: String,
    pub timestamp: DateTime<Local>,
    /// 源文件名
    pub file: String,
    pub prompts: Vec<PromptRecord>,
    /// processed 提示词 -> (llm_id -> 回答)
    pub responses: HashMap<String, HashMap<String, LlmResponse>>,
    /// 目标 id 的顺序（渲染时使用）
    pub target_order: Vec<String>,
    pub outcome: RunOutcome,
    pub export_path: Option<PathBuf>,
    pub export_error: Option<String>,
    /// 每次 `record` 累加，重复的提示词也各算一次
    answered: usize,
    failed: usize,
}

impl BatchLog {
    pub fn new(file: impl Into<String>, target_order: Vec<String>) -> Self {
        let timestamp = Local::now();
        Self {
            id: timestamp.timestamp_millis().to_string(),
            timestamp,
            file: file.into(),
            prompts: Vec::new(),
            responses: HashMap::new(),
            target_order,
            outcome: RunOutcome::Completed,
            export_path: None,
            export_error: None,
            answered: 0,
            failed: 0,
        }
    }

    /// 记录一个提示词及其所有回答
    pub fn record(&mut self, record: PromptRecord, responses: &[LlmResponse]) {
        let by_target = self.responses.entry(record.processed.clone()).or_default();
        for response in responses {
            by_target.insert(response.llm_id.clone(), response.clone());
        }
        self.answered += responses.len();
        self.failed += responses.iter().filter(|r| r.is_error()).count();
        self.prompts.push(record);
    }

    /// 某个提示词在某个目标上的回答
    pub fn response(&self, processed: &str, llm_id: &str) -> Option<&LlmResponse> {
        self.responses.get(processed).and_then(|m| m.get(llm_id))
    }

    /// 回答总数（每个提示词 × 每个目标）
    pub fn answer_count(&self) -> usize {
        self.answered
    }

    /// 失败回答的数量
    pub fn error_count(&self) -> usize {
        self.failed
    }

    /// 生成可读的日志文本
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "执行时间: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "文件: {}", self.file);
        if self.outcome == RunOutcome::Cancelled {
            let _ = writeln!(out, "状态: 已取消");
        }
        if let Some(path) = &self.export_path {
            let _ = writeln!(out, "导出: {}", path.display());
        }
        if let Some(err) = &self.export_error {
            let _ = writeln!(out, "导出失败: {}", err);
        }

        for record in &self.prompts {
            let _ = writeln!(out);
            let _ = writeln!(out, "原始提示词: {}", record.original);
            let _ = writeln!(out, "处理后的提示词: {}", record.processed);
            if !record.variations.is_empty() {
                let _ = writeln!(out, "改写:");
                for variation in &record.variations {
                    let _ = writeln!(out, "  - {}", variation);
                }
            }
            for llm_id in &self.target_order {
                match self.response(&record.processed, llm_id) {
                    Some(resp) => {
                        let _ = writeln!(out, "{} 的回答:", llm_id);
                        let _ = writeln!(out, "  {}", resp.text());
                    }
                    None => {
                        let _ = writeln!(out, "{}: 没有回答", llm_id);
                    }
                }
            }
        }
        out
    }
}
