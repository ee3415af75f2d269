//! 查询改写服务 - 业务能力层
//!
//! 尽力而为：失败时只返回原始查询，不会中断批处理

use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::VariationBackend;

/// 查询改写服务
pub struct VariationService {
    backend: Arc<dyn VariationBackend>,
}

impl VariationService {
    pub fn new(backend: Arc<dyn VariationBackend>) -> Self {
        Self { backend }
    }

    /// 生成改写
    ///
    /// 第一个元素总是 `base_query`，其后是去重后的非空改写；
    /// 请求出错时返回 `[base_query]`
    pub async fn generate_variations(&self, base_query: &str) -> Vec<String> {
        let mut result = vec![base_query.to_string()];

        match self.backend.generate_variations(base_query).await {
            Ok(variations) => {
                for variation in variations {
                    let variation = variation.trim();
                    if variation.is_empty() || result.iter().any(|v| v == variation) {
                        continue;
                    }
                    result.push(variation.to_string());
                }
                debug!("生成 {} 个改写: {}", result.len() - 1, base_query);
            }
            Err(e) => {
                warn!("⚠️ 改写生成失败，仅使用原始查询: {}", e);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl VariationBackend for Failing {
        async fn generate_variations(&self, _text: &str) -> Result<Vec<String>, LlmError> {
            Err(LlmError::VariationGenerationFailed {
                reason: "boom".to_string(),
            })
        }
    }

    struct Canned(Vec<&'static str>);

    #[async_trait]
    impl VariationBackend for Canned {
        async fn generate_variations(&self, _text: &str) -> Result<Vec<String>, LlmError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_base_query() {
        let service = VariationService::new(Arc::new(Failing));
        assert_eq!(service.generate_variations("Q").await, vec!["Q"]);
    }

    #[tokio::test]
    async fn test_base_query_first_and_deduplicated() {
        let service = VariationService::new(Arc::new(Canned(vec!["Q2", "", "Q", "Q2", " Q3 "])));
        assert_eq!(service.generate_variations("Q").await, vec!["Q", "Q2", "Q3"]);
    }

    #[test]
    fn test_empty_variation_list_keeps_base() {
        let service = VariationService::new(Arc::new(Canned(vec![])));
        let result = tokio_test::block_on(service.generate_variations("only"));
        assert_eq!(result, vec!["only"]);
    }
}
