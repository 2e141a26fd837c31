//! 进度报告
//!
//! 编排过程中的所有进度和诊断都通过注入的 `WarmReporter` 输出，
//! 编排逻辑本身不直接写控制台，测试可以换成记录事件的实现。

use tracing::{error, info, warn};

use crate::error::{AppError, EngineError, ParseError};
use crate::models::NodeKey;
use crate::services::WarmReport;
use crate::utils::logging::truncate_text;
use crate::workflow::ConfigurationCtx;

/// 预热进度观察者
pub trait WarmReporter: Send + Sync {
    /// URL 无法解析为配置
    fn configuration_unparsed(&self, source: &str, error: &ParseError);

    fn node_started(&self, node: &NodeKey, configurations: usize);

    /// 节点连接失败，整个节点被跳过
    fn node_skipped(&self, node: &NodeKey, error: &EngineError);

    fn node_completed(&self, node: &NodeKey);

    fn app_started(&self, app_id: Option<&str>);

    /// 应用无法解析或会话无法打开，整个应用组被跳过
    fn app_skipped(&self, app_id: Option<&str>, reason: &str);

    fn configurations_applying(&self, count: usize);

    fn selection_applying(&self, field: &str, values: usize);

    fn warming_started(&self, ctx: &ConfigurationCtx);

    fn warming_done(&self, ctx: &ConfigurationCtx, report: &WarmReport);

    fn configuration_failed(&self, ctx: &ConfigurationCtx, error: &AppError);

    fn app_completed(&self, app_id: &str);

    /// 运行被取消
    fn cancelled(&self);
}

/// 通过 tracing 输出进度
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl WarmReporter for TracingReporter {
    fn configuration_unparsed(&self, source: &str, error: &ParseError) {
        warn!("⚠️ 跳过无法解析的URL {}: {}", truncate_text(source, 120), error);
    }

    fn node_started(&self, node: &NodeKey, configurations: usize) {
        info!("\n{}", "=".repeat(60));
        info!("🌐 正在预热节点: {} ({} 个配置)", node, configurations);
        info!("{}", "=".repeat(60));
    }

    fn node_skipped(&self, node: &NodeKey, error: &EngineError) {
        error!("❌ 节点 {} 连接失败, 跳过: {}", node, error);
    }

    fn node_completed(&self, node: &NodeKey) {
        info!("✓ 节点预热完成: {}", node);
    }

    fn app_started(&self, app_id: Option<&str>) {
        info!("  - 正在预热应用: {}", app_id.unwrap_or("<无 appid>"));
    }

    fn app_skipped(&self, app_id: Option<&str>, reason: &str) {
        warn!(
            "    - ⚠️ 应用 {} 被跳过: {}",
            app_id.unwrap_or("<无 appid>"),
            reason
        );
    }

    fn configurations_applying(&self, count: usize) {
        info!("    - 正在应用 {} 个配置...", count);
    }

    fn selection_applying(&self, field: &str, values: usize) {
        info!("    - 正在选择字段 '{}' ({} 个值)...", field, values);
    }

    fn warming_started(&self, ctx: &ConfigurationCtx) {
        info!("    - {} 🔥 正在预热缓存...", ctx);
    }

    fn warming_done(&self, ctx: &ConfigurationCtx, report: &WarmReport) {
        info!("    - {} ✓ 完成 ({} 个对象)", ctx, report.objects);
    }

    fn configuration_failed(&self, ctx: &ConfigurationCtx, error: &AppError) {
        error!("    - {} ❌ 预热失败: {}", ctx, error);
    }

    fn app_completed(&self, app_id: &str) {
        info!("    - ✅ 应用预热完成: {}", app_id);
    }

    fn cancelled(&self) {
        warn!("⚠️ 收到取消请求，停止预热");
    }
}
