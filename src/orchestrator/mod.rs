//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有会话状态并驱动批处理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session` - 会话
//! - 当前文件、工作表、行/列选择、模板、目标
//! - 运行前对输入做快照，同一时间只允许一次运行
//! - 保存历史批处理日志（最新的在最前）
//!
//! ### `batch_processor` - 程序入口
//! - 加载配置与批处理定义，组装客户端
//! - 读取输入文件、Ctrl-C 取消、输出日志和统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (App)
//!     ↓
//! session (Session)
//!     ↓
//! workflow::BatchFlow (一次批处理)
//!     ↓
//! services (reader / header / template / variation / dispatcher / exporter)
//!     ↓
//! clients (BackendClient / OpenAiClient)
//! ```

pub mod batch_processor;
pub mod session;

pub use batch_processor::App;
pub use session::Session;
