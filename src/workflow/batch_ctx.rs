//! 批处理上下文
//!
//! 封装"正在处理哪个文件、结果写到哪里、是否已被取消"

use std::fmt::Display;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// 批处理上下文
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 本次运行的标识（毫秒时间戳）
    pub run_id: String,

    /// 源文件名（决定导出格式和文件名）
    pub file_name: String,

    /// 导出目录
    pub output_dir: PathBuf,

    /// 在相邻两条提示词之间检查
    pub cancel: CancellationToken,
}

impl BatchCtx {
    pub fn new(file_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: chrono::Local::now().timestamp_millis().to_string(),
            file_name: file_name.into(),
            output_dir: output_dir.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// 使用外部的取消令牌
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 #{} 文件 {}]", self.run_id, self.file_name)
    }
}
