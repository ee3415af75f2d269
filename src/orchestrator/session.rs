//! 会话状态 - 编排层
//!
//! 一个会话持有：当前文件及其网格、工作表列表、行/列选择、模板、目标、历史日志。
//!
//! - 换文件或换工作表都会重建网格并清空选择
//! - 同一时间只允许一次批处理，运行开始时对输入做快照
//! - 日志按时间倒序保存，只在内存中

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{AppResult, PipelineError};
use crate::models::batch_log::BatchLog;
use crate::models::grid::SourceGrid;
use crate::models::selection::{HeaderKind, HeaderSelection};
use crate::models::target::{LlmResponse, LlmTarget};
use crate::models::template::TemplateSet;
use crate::services::{header, reader, SourceWorkbook};
use crate::workflow::{BatchCtx, BatchFlow, BatchInput, BatchOutcome};

/// 已加载的文件
#[derive(Debug, Clone)]
struct LoadedFile {
    bytes: Vec<u8>,
    workbook: SourceWorkbook,
}

#[derive(Debug, Default)]
struct SessionState {
    file: Option<LoadedFile>,
    selection: Option<HeaderSelection>,
    templates: TemplateSet,
    targets: Vec<LlmTarget>,
    generate_variations: bool,
    /// 最新的在最前
    logs: Vec<BatchLog>,
}

/// 运行结束（包括出错返回）时复位运行标志
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 批处理会话
pub struct Session {
    state: RwLock<SessionState>,
    running: AtomicBool,
    flow: BatchFlow,
}

impl Session {
    pub fn new(flow: BatchFlow) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            running: AtomicBool::new(false),
            flow,
        }
    }

    /// 加载文件并解析指定工作表（缺省第一个）
    ///
    /// # 返回
    /// 工作表名列表（非表格格式为空）
    pub async fn load_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        sheet: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let workbook = reader::parse(&bytes, file_name, sheet)?;
        info!(
            "📄 已加载文件 {}: {} 行 × {} 列",
            file_name,
            workbook.grid.row_count(),
            workbook.grid.column_count()
        );
        let sheet_names = workbook.sheet_names.clone();

        let mut state = self.state.write().await;
        state.file = Some(LoadedFile { bytes, workbook });
        state.selection = None;
        Ok(sheet_names)
    }

    /// 切换工作表，重建网格并清空选择
    pub async fn switch_sheet(&self, sheet: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let file = state.file.as_mut().ok_or(PipelineError::NoFile)?;

        let workbook = reader::parse(&file.bytes, &file.workbook.file_name, Some(sheet))?;
        debug!("切换到工作表 {}", sheet);
        file.workbook = workbook;
        state.selection = None;
        Ok(())
    }

    /// 选择一行或一列作为输入，替换之前的选择
    pub async fn select_header(&self, label: &str, kind: HeaderKind) -> AppResult<HeaderSelection> {
        let mut state = self.state.write().await;
        let file = state.file.as_ref().ok_or(PipelineError::NoFile)?;

        let selection = header::select_header(&file.workbook.grid, label, kind)?;
        info!("✓ 已选择{}", selection);
        state.selection = Some(selection.clone());
        Ok(selection)
    }

    pub async fn set_templates(&self, templates: TemplateSet) {
        self.state.write().await.templates = templates;
    }

    pub async fn set_targets(&self, targets: Vec<LlmTarget>) {
        self.state.write().await.targets = targets;
    }

    pub async fn set_generate_variations(&self, enabled: bool) {
        self.state.write().await.generate_variations = enabled;
    }

    pub async fn grid(&self) -> Option<SourceGrid> {
        let state = self.state.read().await;
        state.file.as_ref().map(|f| f.workbook.grid.clone())
    }

    pub async fn sheet_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .file
            .as_ref()
            .map(|f| f.workbook.sheet_names.clone())
            .unwrap_or_default()
    }

    pub async fn active_sheet(&self) -> Option<String> {
        let state = self.state.read().await;
        state.file.as_ref().and_then(|f| f.workbook.active_sheet.clone())
    }

    pub async fn selection(&self) -> Option<HeaderSelection> {
        self.state.read().await.selection.clone()
    }

    /// 历史日志（最新的在最前）
    pub async fn logs(&self) -> Vec<BatchLog> {
        self.state.read().await.logs.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 对当前会话执行一次批处理
    ///
    /// # 参数
    /// - `output_dir`: 导出目录
    /// - `cancel`: 取消令牌，在每条提示词之前检查
    ///
    /// 运行成功（包括被取消、导出失败）时日志都会加入会话
    pub async fn run_batch(
        &self,
        output_dir: &Path,
        cancel: CancellationToken,
    ) -> AppResult<BatchOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PipelineError::RunInProgress.into());
        }
        let _guard = RunGuard(&self.running);

        let (ctx, input) = {
            let state = self.state.read().await;
            let file = state.file.as_ref().ok_or(PipelineError::NoFile)?;
            let ctx = BatchCtx::new(file.workbook.file_name.clone(), output_dir).with_cancel(cancel);
            let input = BatchInput {
                grid: file.workbook.grid.clone(),
                selection: state.selection.clone(),
                templates: state.templates.clone(),
                targets: state.targets.clone(),
                generate_variations: state.generate_variations,
            };
            (ctx, input)
        };

        let outcome = self.flow.run_batch(&ctx, input).await?;

        self.state.write().await.logs.insert(0, outcome.log.clone());
        Ok(outcome)
    }

    /// 单条提示词发送到所有目标
    pub async fn research(&self, prompt: &str, targets: &[LlmTarget]) -> AppResult<Vec<LlmResponse>> {
        self.flow.research(prompt, targets).await
    }
}
