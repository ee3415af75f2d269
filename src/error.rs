use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 表格读取错误
    #[error("表格读取错误: {0}")]
    Source(#[from] SourceError),
    /// 批处理流程错误
    #[error("批处理错误: {0}")]
    Pipeline(#[from] PipelineError),
    /// LLM 调用错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 表格读取错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 不支持的文件格式
    #[error("不支持的文件格式: {file_name}")]
    UnsupportedFormat { file_name: String },
    /// 文件内容无法解析
    #[error("解析文件失败 ({file_name}): {source}")]
    ParseError {
        file_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 工作表不存在
    #[error("工作表不存在: {sheet} (可用: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 批处理流程错误（均在发出任何网络请求之前检查）
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 没有选择文件
    #[error("请先选择文件")]
    NoFile,
    /// 没有选择行或列
    #[error("请先选择一行或一列作为输入")]
    NoSelection,
    /// 没有选择查询模板
    #[error("请至少选择一个查询模板")]
    NoQuerySelected,
    /// 没有选择 LLM
    #[error("请至少选择一个 LLM")]
    NoTargets,
    /// 已有批处理在运行
    #[error("已有批处理正在运行")]
    RunInProgress,
    /// 模板中占位符数量不正确
    #[error("模板必须且只能包含一个占位符 {placeholder}: {template}")]
    InvalidTemplate {
        template: String,
        placeholder: String,
    },
    /// 行/列标签无效
    #[error("无效的{kind}标签: {label}")]
    InvalidLabel { label: String, kind: String },
    /// 行/列超出表格范围
    #[error("{kind} {label} 超出表格范围 (共 {max} 个)")]
    LabelOutOfRange {
        label: String,
        kind: String,
        max: usize,
    },
}

/// LLM 调用错误
///
/// 只携带字符串描述，便于随 `LlmResponse` 一起克隆进日志
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// 目标调用失败
    #[error("{target} 调用失败: {reason}")]
    TargetCallFailed { target: String, reason: String },
    /// 目标返回空结果
    #[error("{target} 返回结果为空")]
    EmptyResponse { target: String },
    /// 目标返回错误状态码
    #[error("{target} 返回错误状态 {status}: {body}")]
    BadStatus {
        target: String,
        status: u16,
        body: String,
    },
    /// 生成改写失败
    #[error("生成查询改写失败: {reason}")]
    VariationGenerationFailed { reason: String },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 写入导出文件失败
    #[error("写入导出文件失败 ({path}): {source}")]
    ExportWriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置内容无效
    #[error("配置无效: {0}")]
    Invalid(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建不支持格式错误
    pub fn unsupported_format(file_name: impl Into<String>) -> Self {
        AppError::Source(SourceError::UnsupportedFormat {
            file_name: file_name.into(),
        })
    }

    /// 创建解析失败错误
    pub fn parse_failed(
        file_name: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Source(SourceError::ParseError {
            file_name: file_name.into(),
            source: Box::new(source),
        })
    }

    /// 创建导出写入失败错误
    pub fn export_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Export(ExportError::ExportWriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

impl LlmError {
    /// 创建目标调用失败错误
    pub fn call_failed(target: impl Into<String>, reason: impl ToString) -> Self {
        LlmError::TargetCallFailed {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
