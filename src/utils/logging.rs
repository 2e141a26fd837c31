//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::orchestrator::RunSummary;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `input`: 输入文件路径
/// - `started_at`: 启动时间
pub fn log_startup(input: &Path, started_at: DateTime<Local>) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 缓存预热模式");
    info!("📄 输入文件: {}", input.display());
    info!("🕐 启动时间: {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
}

/// 记录 URL 加载信息
pub fn log_urls_loaded(total: usize) {
    info!("✓ 找到 {} 个待预热的URL", total);
    info!("💡 将按节点 → 应用 → 配置的顺序依次处理\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 运行统计
/// - `started_at`: 启动时间（用于计算耗时）
pub fn print_final_stats(summary: &RunSummary, started_at: DateTime<Local>) {
    let finished_at = Local::now();
    let elapsed = finished_at.signed_duration_since(started_at);

    info!("\n{}", "=".repeat(60));
    info!("📊 全部预热完成统计");
    info!("完成时间: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    info!("总耗时: {} 秒", elapsed.num_seconds());
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.warmed, summary.total);
    info!("❌ 失败: {}", summary.failed);
    info!("⏭️ 跳过: {} (应用组 {})", summary.skipped, summary.skipped_apps);
    info!("⚠️ 无法解析的URL: {}", summary.unparsed);
    if summary.cancelled {
        info!("🛑 运行已被取消");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
