use crate::error::{AppResult, ConfigError};
use crate::models::selection::HeaderKind;
use crate::models::target::LlmTarget;
use crate::models::template::{TemplateSet, DEFAULT_PLACEHOLDER};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 批处理定义文件（TOML）
#[derive(Debug, Clone, Deserialize)]
pub struct BatchDefinition {
    /// 输入文件
    pub input: Option<PathBuf>,
    /// 工作表名，缺省取第一个
    pub sheet: Option<String>,
    /// 作为输入的行或列
    pub header: Option<HeaderSpec>,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// 是否先为每个基础模板生成改写
    #[serde(default)]
    pub generate_variations: bool,
    #[serde(default)]
    pub templates: Vec<TemplateEntry>,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderSpec {
    pub kind: HeaderKind,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEntry {
    pub text: String,
    #[serde(default = "default_true")]
    pub selected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetEntry {
    #[serde(flatten)]
    pub target: LlmTarget,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_true() -> bool {
    true
}

impl BatchDefinition {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        let definition: BatchDefinition =
            toml::from_str(content).map_err(|e| ConfigError::TomlParseFailed {
                path: path.to_string(),
                source: e,
            })?;
        definition.validate()?;
        Ok(definition)
    }

    /// 校验：至少一个目标、目标 id 唯一、占位符非空、模板合法
    pub fn validate(&self) -> AppResult<()> {
        if self.placeholder.is_empty() {
            return Err(ConfigError::Invalid("placeholder 不能为空".to_string()).into());
        }
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid("至少需要配置一个 [[targets]]".to_string()).into());
        }

        let mut seen = HashSet::new();
        for entry in &self.targets {
            if !seen.insert(entry.target.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "目标 id 重复: {}",
                    entry.target.id
                ))
                .into());
            }
        }

        self.template_set().map(|_| ())
    }

    /// 构建模板集合
    pub fn template_set(&self) -> AppResult<TemplateSet> {
        let mut set = TemplateSet::new(self.placeholder.clone());
        for entry in &self.templates {
            set.add(entry.text.clone(), entry.selected)?;
        }
        Ok(set)
    }

    /// 启用的目标（保持配置顺序）
    pub fn enabled_targets(&self) -> Vec<LlmTarget> {
        self.targets
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.target.clone())
            .collect()
    }
}

/// 从文件加载批处理定义
pub async fn load_batch_definition(path: &Path) -> AppResult<BatchDefinition> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;

    let definition = BatchDefinition::from_toml_str(&content, &path.display().to_string())?;

    tracing::info!(
        "已加载批处理定义: {} 个模板, {} 个目标",
        definition.templates.len(),
        definition.targets.len()
    );

    Ok(definition)
}
