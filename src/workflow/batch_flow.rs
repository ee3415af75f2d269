//! 批处理流程 - 流程层
//!
//! 核心职责：定义"一次批处理"的完整流程
//!
//! 流程顺序：
//! 1. 校验（目标、模板）→ 解析所选行/列
//! 2. （可选）为基础模板生成改写
//! 3. 展开提示词（源值优先、模板其次）
//! 4. 逐条分发：同一条提示词的所有目标并发，不同提示词严格串行
//! 5. 汇总成结果行 → 导出
//!
//! 1~3 的失败都在发出任何 LLM 请求前中止本次运行；
//! 改写和单个目标的失败在各自范围内被吸收。

use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{AppResult, PipelineError};
use crate::models::batch_log::{BatchLog, PromptRecord, RunOutcome};
use crate::models::grid::SourceGrid;
use crate::models::selection::HeaderSelection;
use crate::models::target::{LlmResponse, LlmTarget};
use crate::models::template::TemplateSet;
use crate::services::{exporter, header, template, Dispatcher, VariationService};
use crate::utils::logging;
use crate::workflow::batch_ctx::BatchCtx;

/// 批处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Validating,
    Resolving,
    Expanding,
    Dispatching,
    Aggregating,
    Exporting,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStage::Validating => "校验",
            BatchStage::Resolving => "解析输入",
            BatchStage::Expanding => "展开提示词",
            BatchStage::Dispatching => "分发",
            BatchStage::Aggregating => "汇总",
            BatchStage::Exporting => "导出",
        };
        f.write_str(name)
    }
}

/// 一次批处理的输入快照
///
/// 运行开始时从会话复制，运行期间会话再怎么变化都不影响本次运行
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub grid: SourceGrid,
    pub selection: Option<HeaderSelection>,
    pub templates: TemplateSet,
    pub targets: Vec<LlmTarget>,
    pub generate_variations: bool,
}

/// 批处理结果
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub log: BatchLog,
    /// 每个源值一行，每行 模板数 × 目标数 个单元格
    pub export_rows: Vec<Vec<String>>,
}

/// 批处理流程
///
/// - 编排完整的批处理流程
/// - 不持有会话状态，只依赖业务能力（services）
pub struct BatchFlow {
    dispatcher: Dispatcher,
    variations: VariationService,
    prompt_interval: Duration,
}

impl BatchFlow {
    pub fn new(dispatcher: Dispatcher, variations: VariationService) -> Self {
        Self {
            dispatcher,
            variations,
            prompt_interval: Duration::ZERO,
        }
    }

    /// 相邻两条提示词之间的间隔
    pub fn with_prompt_interval(mut self, interval: Duration) -> Self {
        self.prompt_interval = interval;
        self
    }

    pub async fn run_batch(&self, ctx: &BatchCtx, input: BatchInput) -> AppResult<BatchOutcome> {
        let span = info_span!("batch", run_id = %ctx.run_id);
        self.run_batch_inner(ctx, input).instrument(span).await
    }

    async fn run_batch_inner(&self, ctx: &BatchCtx, input: BatchInput) -> AppResult<BatchOutcome> {
        let BatchInput {
            grid,
            selection,
            mut templates,
            targets,
            generate_variations,
        } = input;

        // ========== 校验 ==========
        self.enter(ctx, BatchStage::Validating);
        if targets.is_empty() {
            return Err(PipelineError::NoTargets.into());
        }
        if templates.selected().is_empty() {
            return Err(PipelineError::NoQuerySelected.into());
        }

        // ========== 解析所选行/列 ==========
        self.enter(ctx, BatchStage::Resolving);
        let values = header::resolve_selected_values(&grid, selection.as_ref())?;
        if values.is_empty() {
            warn!("{} ⚠️ 所选{}没有非空值", ctx, selection.as_ref().map(|s| s.to_string()).unwrap_or_default());
        }

        // ========== 改写（尽力而为） ==========
        if generate_variations {
            self.expand_variations(ctx, &mut templates).await;
        }

        // ========== 展开 ==========
        self.enter(ctx, BatchStage::Expanding);
        let selected = templates.selected();
        let prompts = template::expand(&values, &selected, templates.placeholder())?;
        let per_row = selected.len();

        logging::log_batch_start(&ctx.file_name, values.len(), per_row, targets.len());
        debug!(
            "{} 每行列顺序: 模板优先, 目标其次 ({:?})",
            ctx,
            targets.iter().map(|t| t.id.as_str()).collect::<Vec<_>>()
        );

        // ========== 分发 ==========
        self.enter(ctx, BatchStage::Dispatching);
        let mut log = BatchLog::new(
            ctx.file_name.clone(),
            targets.iter().map(|t| t.id.clone()).collect(),
        );
        log.id = ctx.run_id.clone();

        let mut export_rows = Vec::with_capacity(values.len());
        let mut row: Vec<String> = Vec::with_capacity(per_row * targets.len());
        let total = prompts.len();

        for (i, prompt) in prompts.iter().enumerate() {
            if ctx.is_cancelled() {
                warn!("{} ⛔ 已取消，完成 {}/{} 条提示词", ctx, i, total);
                log.outcome = RunOutcome::Cancelled;
                break;
            }

            logging::log_prompt_start(i + 1, total, &prompt.text);
            let responses = self.dispatcher.dispatch(&prompt.text, &targets).await;
            row.extend(responses.iter().map(LlmResponse::text));

            let base = templates
                .templates()
                .iter()
                .find(|t| t.text == prompt.template)
                .and_then(|t| t.derived_from.clone())
                .unwrap_or_else(|| prompt.template.clone());
            log.record(
                PromptRecord {
                    variations: templates.variations_of(&base),
                    original: base,
                    processed: prompt.text.clone(),
                },
                &responses,
            );

            // 一个源值的全部模板处理完，这一行就完整了
            if prompt.template_index + 1 == per_row {
                export_rows.push(std::mem::take(&mut row));
            }

            if !self.prompt_interval.is_zero() && i + 1 < total {
                tokio::time::sleep(self.prompt_interval).await;
            }
        }

        // ========== 汇总 ==========
        self.enter(ctx, BatchStage::Aggregating);
        logging::log_batch_complete(export_rows.len(), log.prompts.len(), log.error_count());

        // ========== 导出 ==========
        if log.outcome == RunOutcome::Completed {
            self.enter(ctx, BatchStage::Exporting);
            match exporter::export_rows(&export_rows, &ctx.file_name, &ctx.output_dir) {
                Ok(path) => log.export_path = Some(path),
                Err(e) => {
                    // 导出失败不丢弃已计算的结果
                    error!("{} ❌ 导出失败: {}", ctx, e);
                    log.export_error = Some(e.to_string());
                }
            }
        } else {
            info!("{} 运行已取消，跳过导出", ctx);
        }

        Ok(BatchOutcome { log, export_rows })
    }

    /// 为每个已选的基础模板生成改写，并作为已选模板加入集合
    async fn expand_variations(&self, ctx: &BatchCtx, templates: &mut TemplateSet) {
        let bases: Vec<String> = templates
            .selected()
            .into_iter()
            .filter(|t| !t.is_variation())
            .map(|t| t.text.clone())
            .collect();

        for base in bases {
            let generated = self.variations.generate_variations(&base).await;
            // 第一个元素是原始查询本身
            let variations = generated.get(1..).unwrap_or_default();
            let added = templates.add_variations(&base, variations, true);
            info!("{} 🔀 模板改写 +{}: {}", ctx, added, logging::truncate_text(&base, 60));
        }
    }

    /// 单条提示词的多目标调研（不涉及文件）
    pub async fn research(&self, prompt: &str, targets: &[LlmTarget]) -> AppResult<Vec<LlmResponse>> {
        if targets.is_empty() {
            return Err(PipelineError::NoTargets.into());
        }
        if prompt.trim().is_empty() {
            return Err(PipelineError::NoQuerySelected.into());
        }
        info!("🔎 调研: {}", logging::truncate_text(prompt, 80));
        Ok(self.dispatcher.dispatch(prompt, targets).await)
    }

    fn enter(&self, ctx: &BatchCtx, stage: BatchStage) {
        debug!("{} → {}", ctx, stage);
    }
}
