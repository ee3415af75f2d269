use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// AI 后端地址
    pub backend_base_url: String,
    /// 批处理定义文件
    pub batch_config_file: PathBuf,
    /// 输入文件（覆盖定义文件中的 input）
    pub input_file: Option<PathBuf>,
    /// 导出目录，缺省为输入文件所在目录
    pub output_dir: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 相邻两个提示词之间的间隔（毫秒）
    pub prompt_interval_ms: u64,
    /// 设置后只对这一条提示词做多模型调研，不读取文件
    pub research_prompt: Option<String>,
    /// 无法解析、已退回默认值的环境变量（日志初始化之后再输出）
    pub fallback_notices: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: "http://127.0.0.1:8000".to_string(),
            batch_config_file: PathBuf::from("batch.toml"),
            input_file: None,
            output_dir: None,
            verbose_logging: false,
            request_timeout_secs: 120,
            prompt_interval_ms: 0,
            research_prompt: None,
            fallback_notices: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，便于测试
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let mut notices = Vec::new();
        let verbose_logging = parse_or(&lookup, "VERBOSE_LOGGING", default.verbose_logging, &mut notices);
        let request_timeout_secs =
            parse_or(&lookup, "REQUEST_TIMEOUT_SECS", default.request_timeout_secs, &mut notices);
        let prompt_interval_ms =
            parse_or(&lookup, "PROMPT_INTERVAL_MS", default.prompt_interval_ms, &mut notices);

        Self {
            backend_base_url: lookup("BACKEND_BASE_URL").unwrap_or(default.backend_base_url),
            batch_config_file: lookup("BATCH_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.batch_config_file),
            input_file: lookup("INPUT_FILE").filter(|v| !v.is_empty()).map(PathBuf::from),
            output_dir: lookup("OUTPUT_DIR").filter(|v| !v.is_empty()).map(PathBuf::from),
            verbose_logging,
            request_timeout_secs,
            prompt_interval_ms,
            research_prompt: lookup("RESEARCH_PROMPT").filter(|v| !v.trim().is_empty()),
            fallback_notices: notices,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn prompt_interval(&self) -> Duration {
        Duration::from_millis(self.prompt_interval_ms)
    }

    /// 输出读取配置时退回默认值的提示，需在 `logging::init` 之后调用
    pub fn log_fallbacks(&self) {
        for notice in &self.fallback_notices {
            warn!("⚠️ {}", notice);
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    notices: &mut Vec<String>,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            notices.push(format!("环境变量 {} 的值 '{}' 无法解析，使用默认值", key, raw));
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.backend_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(config.input_file.is_none());
        assert!(config.research_prompt.is_none());
    }

    #[test]
    fn test_values_from_lookup_and_bad_numbers_fall_back() {
        let vars: HashMap<&str, &str> = [
            ("BACKEND_BASE_URL", "http://ai.internal:9000"),
            ("INPUT_FILE", "data.csv"),
            ("VERBOSE_LOGGING", "true"),
            ("REQUEST_TIMEOUT_SECS", "abc"),
            ("PROMPT_INTERVAL_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend_base_url, "http://ai.internal:9000");
        assert_eq!(config.input_file, Some(PathBuf::from("data.csv")));
        assert!(config.verbose_logging);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.prompt_interval(), Duration::from_millis(250));
        assert_eq!(config.fallback_notices.len(), 1);
        assert!(config.fallback_notices[0].contains("REQUEST_TIMEOUT_SECS"));
        assert!(config.fallback_notices[0].contains("abc"));
    }

    #[test]
    fn test_no_notices_for_valid_values() {
        let config = Config::from_lookup(|k| match k {
            "VERBOSE_LOGGING" => Some("false".to_string()),
            "PROMPT_INTERVAL_MS" => Some(" 10 ".to_string()),
            _ => None,
        });
        assert!(config.fallback_notices.is_empty());
        assert_eq!(config.prompt_interval_ms, 10);
    }
}
