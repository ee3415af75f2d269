//! 外部服务客户端
//!
//! - `BackendClient`：AI 后端（submit-prompt / generate-variations）
//! - `OpenAiClient`：直接调用 OpenAI 兼容接口
//! - `TargetRouter`：按目标的 `transport` 选择客户端
//!
//! 上层只依赖 `LlmBackend` / `VariationBackend` 两个 trait，测试中可替换为内存实现

pub mod backend_client;
pub mod llm_client;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LlmError;
use crate::models::target::{LlmTarget, Transport};

pub use backend_client::BackendClient;
pub use llm_client::OpenAiClient;

/// 向单个目标提交提示词
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn submit(&self, prompt: &str, target: &LlmTarget) -> Result<String, LlmError>;
}

/// 为查询生成改写
#[async_trait]
pub trait VariationBackend: Send + Sync {
    async fn generate_variations(&self, text: &str) -> Result<Vec<String>, LlmError>;
}

/// 按 `Transport` 分发到对应客户端
pub struct TargetRouter {
    backend: Arc<dyn LlmBackend>,
    openai: Arc<dyn LlmBackend>,
}

impl TargetRouter {
    pub fn new(backend: Arc<dyn LlmBackend>, openai: Arc<dyn LlmBackend>) -> Self {
        Self { backend, openai }
    }
}

#[async_trait]
impl LlmBackend for TargetRouter {
    async fn submit(&self, prompt: &str, target: &LlmTarget) -> Result<String, LlmError> {
        match target.transport {
            Transport::Backend => self.backend.submit(prompt, target).await,
            Transport::Openai => self.openai.submit(prompt, target).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl LlmBackend for Fixed {
        async fn submit(&self, _prompt: &str, _target: &LlmTarget) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn target(transport: Transport) -> LlmTarget {
        LlmTarget {
            id: "t".to_string(),
            name: "T".to_string(),
            endpoint: String::new(),
            api_key: String::new(),
            model: "m".to_string(),
            custom_prompt: None,
            transport,
        }
    }

    #[tokio::test]
    async fn test_router_picks_client_by_transport() {
        let router = TargetRouter::new(Arc::new(Fixed("backend")), Arc::new(Fixed("openai")));

        assert_eq!(
            router.submit("p", &target(Transport::Backend)).await.unwrap(),
            "backend"
        );
        assert_eq!(
            router.submit("p", &target(Transport::Openai)).await.unwrap(),
            "openai"
        );
    }
}
