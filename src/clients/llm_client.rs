/// OpenAI 兼容接口客户端
///
/// 直接使用目标自身的 endpoint / api_key / model 调用 chat completion，
/// `custom_prompt` 作为系统消息发送
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::LlmBackend;
use crate::config::Config;
use crate::error::LlmError;
use crate::models::target::LlmTarget;

/// OpenAI 兼容客户端
pub struct OpenAiClient {
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
        }
    }

    /// 构建消息列表
    fn build_messages(
        prompt: &str,
        target: &LlmTarget,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let name = target.display_name();
        let mut messages = Vec::new();

        // 添加系统消息（如果配置了）
        if let Some(sys_msg) = target.custom_prompt.as_deref().filter(|s| !s.is_empty()) {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| LlmError::call_failed(name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LlmError::call_failed(name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        Ok(messages)
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    async fn submit(&self, prompt: &str, target: &LlmTarget) -> Result<String, LlmError> {
        let name = target.display_name();
        debug!("调用 OpenAI 兼容接口，目标: {}, 模型: {}", name, target.model);

        let openai_config = OpenAIConfig::new()
            .with_api_key(&target.api_key)
            .with_api_base(&target.endpoint);
        let client = Client::with_config(openai_config);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&target.model)
            .messages(Self::build_messages(prompt, target)?)
            .build()
            .map_err(|e| LlmError::call_failed(name, e))?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| LlmError::call_failed(name, format!("请求超时 ({:?})", self.timeout)))?
            .map_err(|e| {
                warn!("{} 调用失败: {}", name, e);
                LlmError::call_failed(name, e)
            })?;

        debug!("{} 调用成功", name);

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                target: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::Transport;

    fn target(custom_prompt: Option<&str>) -> LlmTarget {
        LlmTarget {
            id: "local".to_string(),
            name: "Local".to_string(),
            endpoint: "http://127.0.0.1:11434/v1".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
            custom_prompt: custom_prompt.map(str::to_string),
            transport: Transport::Openai,
        }
    }

    #[test]
    fn test_custom_prompt_becomes_system_message() {
        let messages = OpenAiClient::build_messages("hi", &target(Some("Be brief."))).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_no_system_message_without_custom_prompt() {
        let messages = OpenAiClient::build_messages("hi", &target(Some(""))).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    #[ignore] // 需要本地 OpenAI 兼容服务
    async fn test_submit_live() {
        let _ = tracing_subscriber::fmt::try_init();
        let client = OpenAiClient::new(&Config::default());
        let answer = client.submit("用一句话介绍你自己", &target(None)).await.unwrap();
        println!("{}", answer);
        assert!(!answer.is_empty());
    }
}
