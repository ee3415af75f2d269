/// 日志工具模块
///
/// 提供日志初始化与格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(backend_base_url: &str, target_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量提示词处理模式");
    info!("🌐 AI 后端: {}", backend_base_url);
    info!("🤖 已启用 LLM 数量: {}", target_count);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `file`: 源文件名
/// - `values`: 源值数量
/// - `templates`: 已选模板数量
/// - `targets`: 目标数量
pub fn log_batch_start(file: &str, values: usize, templates: usize, targets: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批处理: {}", file);
    info!(
        "📄 源值 {} 个 × 模板 {} 个 = 提示词 {} 条，每条发送到 {} 个 LLM",
        values,
        templates,
        values * templates,
        targets
    );
    info!("{}", "=".repeat(60));
}

/// 记录单条提示词开始
pub fn log_prompt_start(index: usize, total: usize, prompt: &str) {
    info!("[{}/{}] 📝 {}", index, total, truncate_text(prompt, 80));
}

/// 记录批次完成信息
pub fn log_batch_complete(rows: usize, prompts: usize, errors: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 批处理完成: 输出 {} 行, 提示词 {} 条, 失败回答 {} 个", rows, prompts, errors);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(answers: usize, failed: usize, export: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功回答: {}/{}", answers.saturating_sub(failed), answers);
    info!("❌ 失败回答: {}", failed);
    info!("{}", "=".repeat(60));
    match export {
        Some(path) => info!("\n结果已导出至: {}", path),
        None => info!("\n本次没有导出文件"),
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("你好世界", 2), "你好...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
