//! 多目标分发服务 - 业务能力层
//!
//! 一条提示词同时发送到所有目标，全部返回后按目标顺序汇总。
//! 单个目标失败只影响它自己的那一格，整体调用不会失败。

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::LlmBackend;
use crate::error::LlmError;
use crate::models::target::{LlmResponse, LlmTarget};

/// 多目标分发器
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn LlmBackend>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// 分发一条提示词
    ///
    /// # 返回
    /// 每个目标一条回答，顺序与 `targets` 一致
    pub async fn dispatch(&self, prompt: &str, targets: &[LlmTarget]) -> Vec<LlmResponse> {
        let calls = targets.iter().map(|target| self.call_target(prompt, target));
        join_all(calls).await
    }

    async fn call_target(&self, prompt: &str, target: &LlmTarget) -> LlmResponse {
        let name = target.display_name();
        let result = match self.backend.submit(prompt, target).await {
            Ok(text) if text.trim().is_empty() => Err(LlmError::EmptyResponse {
                target: name.to_string(),
            }),
            other => other,
        };

        match &result {
            Ok(text) => debug!("✓ {} 回答 {} 字符", name, text.chars().count()),
            Err(e) => warn!("⚠️ {}", e),
        }

        LlmResponse {
            llm_id: target.id.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::target::Transport;
    use async_trait::async_trait;
    use std::time::Duration;

    /// 按目标 id 决定行为的模拟后端
    struct Scripted;

    #[async_trait]
    impl LlmBackend for Scripted {
        async fn submit(&self, prompt: &str, target: &LlmTarget) -> Result<String, LlmError> {
            match target.id.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(format!("slow:{}", prompt))
                }
                "fail" => Err(LlmError::call_failed(target.display_name(), "connection reset")),
                "blank" => Ok("   ".to_string()),
                _ => Ok(format!("{}:{}", target.id, prompt)),
            }
        }
    }

    fn target(id: &str) -> LlmTarget {
        LlmTarget {
            id: id.to_string(),
            name: id.to_uppercase(),
            endpoint: String::new(),
            api_key: String::new(),
            model: "m".to_string(),
            custom_prompt: None,
            transport: Transport::Backend,
        }
    }

    #[tokio::test]
    async fn test_results_follow_target_order() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted));
        let targets = vec![target("slow"), target("fast"), target("fail"), target("blank")];

        let responses = dispatcher.dispatch("hi", &targets).await;

        assert_eq!(responses.len(), 4);
        let ids: Vec<&str> = responses.iter().map(|r| r.llm_id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast", "fail", "blank"]);
        assert_eq!(responses[0].text(), "slow:hi");
        assert_eq!(responses[1].text(), "fast:hi");
        assert!(responses[2].text().contains("ERROR"));
        assert_eq!(
            responses[3].result,
            Err(LlmError::EmptyResponse {
                target: "BLANK".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_calls_run_concurrently() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted));
        let targets = vec![target("slow"), target("slow"), target("slow"), target("slow")];

        let started = std::time::Instant::now();
        dispatcher.dispatch("x", &targets).await;
        // 串行需要 200ms 以上
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_no_targets_no_responses() {
        let dispatcher = Dispatcher::new(Arc::new(Scripted));
        assert!(dispatcher.dispatch("x", &[]).await.is_empty());
    }
}
