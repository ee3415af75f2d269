//! # Batch Prompt
//!
//! 把表格中的一行或一列代入提示词模板，批量发送到多个 LLM，并把回答导出为新表格
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 访问外部服务，只暴露 `LlmBackend` / `VariationBackend` 两个能力
//! - `BackendClient` - AI 后端（submit-prompt / generate-variations）
//! - `OpenAiClient` - OpenAI 兼容接口
//!
//! ### ② 业务能力层（Services）
//! - `reader` - 读取 csv / tsv / txt / xlsx / xls / ods
//! - `header` - 行列标签与选择
//! - `template` - 提示词展开
//! - `variation` - 查询改写
//! - `dispatcher` - 多目标并发分发
//! - `exporter` - 导出结果
//!
//! ### ③ 流程层（Workflow）
//! - `BatchCtx` - 上下文封装（run_id + 文件名 + 取消令牌）
//! - `BatchFlow` - 流程编排（校验 → 展开 → 分发 → 汇总 → 导出）
//!
//! ### ④ 编排层（Orchestration）
//! - `Session` - 会话状态与运行互斥
//! - `App` - 程序入口

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchLog, HeaderKind, LlmResponse, LlmTarget, SourceGrid, TemplateSet};
pub use orchestrator::{App, Session};
pub use workflow::{BatchCtx, BatchFlow, BatchInput, BatchOutcome};
