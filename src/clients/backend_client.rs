/// AI 后端客户端
///
/// 封装与 AI 后端的 HTTP 交互：
/// - `POST /api/ai/submit-prompt`：`{prompt, llmConfig}` -> `{response}`
/// - `POST /api/ai/generate-variations`：`{text}` -> `{variations}`
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LlmBackend, VariationBackend};
use crate::config::Config;
use crate::error::{AppResult, ConfigError, LlmError};
use crate::models::target::LlmTarget;
use crate::utils::logging::truncate_text;

const SUBMIT_PROMPT_PATH: &str = "/api/ai/submit-prompt";
const GENERATE_VARIATIONS_PATH: &str = "/api/ai/generate-variations";
const VARIATION_SERVICE_NAME: &str = "generate-variations";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPromptRequest<'a> {
    prompt: &'a str,
    llm_config: LlmConfigPayload<'a>,
}

/// 发送给后端的目标配置（字段名为 camelCase）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LlmConfigPayload<'a> {
    id: &'a str,
    name: &'a str,
    endpoint: &'a str,
    api_key: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_prompt: Option<&'a str>,
}

impl<'a> From<&'a LlmTarget> for LlmConfigPayload<'a> {
    fn from(target: &'a LlmTarget) -> Self {
        Self {
            id: &target.id,
            name: &target.name,
            endpoint: &target.endpoint,
            api_key: &target.api_key,
            model: &target.model,
            custom_prompt: target.custom_prompt.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitPromptResponse {
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateVariationsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateVariationsResponse {
    variations: Option<Vec<String>>,
}

/// AI 后端客户端
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// 按配置创建客户端（带请求超时）
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::Invalid(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self::with_client(http, config.backend_base_url.clone()))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// 发送 JSON 请求并解析 JSON 响应
    ///
    /// 非 2xx 状态码时优先取响应体中的 `detail` 字段作为错误描述
    async fn post_json<B, R>(&self, path: &str, body: &B, target: &str) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {} ({})", url, target);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::call_failed(target, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = error_detail(&text).unwrap_or_else(|| truncate_text(&text, 200));
            warn!("{} 返回错误状态 {}: {}", target, status, body);
            return Err(LlmError::BadStatus {
                target: target.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::call_failed(target, format!("响应解析失败: {}", e)))
    }
}

/// 提取 FastAPI 风格错误响应中的 `detail`
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl LlmBackend for BackendClient {
    async fn submit(&self, prompt: &str, target: &LlmTarget) -> Result<String, LlmError> {
        let request = SubmitPromptRequest {
            prompt,
            llm_config: LlmConfigPayload::from(target),
        };

        let response: SubmitPromptResponse = self
            .post_json(SUBMIT_PROMPT_PATH, &request, target.display_name())
            .await?;

        response
            .response
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                target: target.display_name().to_string(),
            })
    }
}

#[async_trait]
impl VariationBackend for BackendClient {
    async fn generate_variations(&self, text: &str) -> Result<Vec<String>, LlmError> {
        let response: GenerateVariationsResponse = self
            .post_json(
                GENERATE_VARIATIONS_PATH,
                &GenerateVariationsRequest { text },
                VARIATION_SERVICE_NAME,
            )
            .await
            .map_err(|e| LlmError::VariationGenerationFailed {
                reason: e.to_string(),
            })?;

        response
            .variations
            .ok_or_else(|| LlmError::VariationGenerationFailed {
                reason: "响应中缺少 variations 字段".to_string(),
            })
    }
}
