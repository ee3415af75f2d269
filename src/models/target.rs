use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// 调用目标时使用的通道
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// 经由 AI 后端的 submit-prompt 接口
    #[default]
    Backend,
    /// 直接调用 OpenAI 兼容接口
    Openai,
}

/// 一个可调用的 LLM 目标
///
/// 一次批处理开始后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmTarget {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub transport: Transport,
}

impl LlmTarget {
    /// 显示名，未设置时退回 id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// 单个目标对单个提示词的回答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub llm_id: String,
    pub result: Result<String, LlmError>,
}

impl LlmResponse {
    pub fn ok(llm_id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            llm_id: llm_id.into(),
            result: Ok(response.into()),
        }
    }

    pub fn failed(llm_id: impl Into<String>, error: LlmError) -> Self {
        Self {
            llm_id: llm_id.into(),
            result: Err(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }

    /// 写入结果表格的文本；失败时是带 `[ERROR]` 标记的错误描述
    pub fn text(&self) -> String {
        match &self.result {
            Ok(response) => response.clone(),
            Err(e) => format!("[ERROR] {}", e),
        }
    }
}
