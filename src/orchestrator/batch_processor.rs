//! 批处理入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载批处理定义、创建客户端、组装 Session
//! 2. **准备输入**：读取文件、选择工作表和行/列、设置模板与目标
//! 3. **运行**：执行批处理（Ctrl-C 取消），输出日志与统计
//! 4. **调研模式**：设置了 `RESEARCH_PROMPT` 时只发送这一条提示词
//!
//! 不处理单条提示词的细节，全部委托给 Session / BatchFlow

use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::{BackendClient, OpenAiClient, TargetRouter};
use crate::config::Config;
use crate::models::loaders::BatchDefinition;
use crate::models::{load_batch_definition, RunOutcome};
use crate::orchestrator::session::Session;
use crate::services::{reader, Dispatcher, VariationService};
use crate::utils::logging;
use crate::workflow::BatchFlow;

/// 应用主结构
pub struct App {
    config: Config,
    definition: BatchDefinition,
    session: Session,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let definition = load_batch_definition(&config.batch_config_file)
            .await
            .with_context(|| {
                format!("加载批处理定义失败: {}", config.batch_config_file.display())
            })?;

        let backend = Arc::new(BackendClient::new(&config).context("创建 AI 后端客户端失败")?);
        let openai = Arc::new(OpenAiClient::new(&config));
        let router = TargetRouter::new(backend.clone(), openai);

        let flow = BatchFlow::new(
            Dispatcher::new(Arc::new(router)),
            VariationService::new(backend),
        )
        .with_prompt_interval(config.prompt_interval());

        let session = Session::new(flow);
        session.set_templates(definition.template_set()?).await;
        session.set_targets(definition.enabled_targets()).await;
        session
            .set_generate_variations(definition.generate_variations)
            .await;

        logging::log_startup(&config.backend_base_url, definition.enabled_targets().len());

        Ok(Self {
            config,
            definition,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        if let Some(prompt) = &self.config.research_prompt {
            return self.run_research(prompt).await;
        }

        let input = self.input_path()?;
        self.prepare(&input).await?;

        let cancel = CancellationToken::new();
        let watcher = spawn_ctrl_c_watcher(cancel.clone());

        let output_dir = self.output_dir(&input);
        let result = self.session.run_batch(&output_dir, cancel).await;
        watcher.abort();

        let outcome = result.context("批处理失败")?;
        let log = &outcome.log;
        println!("{}", log.render());

        if log.outcome == RunOutcome::Cancelled {
            warn!("⛔ 批处理被取消，已完成 {} 行，未导出", outcome.export_rows.len());
        }
        if let Some(e) = &log.export_error {
            error!("❌ 结果未能导出: {}", e);
        }

        let export = log.export_path.as_ref().map(|p| p.display().to_string());
        logging::print_final_stats(log.answer_count(), log.error_count(), export.as_deref());

        Ok(())
    }

    /// 读取文件并完成工作表、行/列的选择
    async fn prepare(&self, input: &Path) -> Result<()> {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("无效的输入文件路径: {}", input.display()))?;

        info!("\n📁 正在读取文件: {}", input.display());
        let bytes = reader::read_bytes(input).await?;
        let sheet_names = self
            .session
            .load_file(&file_name, bytes, self.definition.sheet.as_deref())
            .await
            .with_context(|| format!("解析文件失败: {}", file_name))?;

        if !sheet_names.is_empty() {
            info!(
                "📑 工作表: {:?}，当前: {}",
                sheet_names,
                self.session.active_sheet().await.unwrap_or_default()
            );
        }

        match &self.definition.header {
            Some(spec) => {
                self.session.select_header(&spec.label, spec.kind).await?;
            }
            None => warn!("⚠️ 批处理定义中没有 header，运行时将提示未选择输入"),
        }

        Ok(())
    }

    async fn run_research(&self, prompt: &str) -> Result<()> {
        let targets = self.definition.enabled_targets();
        let responses = self.session.research(prompt, &targets).await?;

        info!("\n{}", "=".repeat(60));
        for response in &responses {
            let name = targets
                .iter()
                .find(|t| t.id == response.llm_id)
                .map(|t| t.display_name())
                .unwrap_or(response.llm_id.as_str());
            println!("【{}】\n{}\n", name, response.text());
        }

        let failed = responses.iter().filter(|r| r.is_error()).count();
        logging::print_final_stats(responses.len(), failed, None);
        Ok(())
    }

    /// `INPUT_FILE` 优先，其次是定义文件中的 `input`（相对定义文件所在目录）
    fn input_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.input_file {
            return Ok(path.clone());
        }
        let input = self
            .definition
            .input
            .as_ref()
            .context("未指定输入文件：请设置 INPUT_FILE 或在批处理定义中填写 input")?;

        if input.is_absolute() {
            return Ok(input.clone());
        }
        let base = self
            .config
            .batch_config_file
            .parent()
            .unwrap_or_else(|| Path::new(""));
        Ok(base.join(input))
    }

    fn output_dir(&self, input: &Path) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// 第二次 Ctrl-C 时进程退出码
const INTERRUPT_EXIT_CODE: i32 = 130;

fn spawn_ctrl_c_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if watch_interrupts(cancel, tokio::signal::ctrl_c).await {
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
    })
}

/// 第一次中断：取消令牌，等当前提示词完成；第二次中断：返回 `true`，由调用方立即退出
///
/// 监听信号失败时返回 `false`
async fn watch_interrupts<S, F>(cancel: CancellationToken, mut next_signal: S) -> bool
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    warn!("⛔ 收到 Ctrl-C，当前提示词完成后停止（再按一次立即退出）");
    cancel.cancel();

    if next_signal().await.is_err() {
        return false;
    }
    error!("⛔ 再次收到 Ctrl-C，立即退出");
    true
}
