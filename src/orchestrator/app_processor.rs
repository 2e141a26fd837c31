//! 节点内的应用处理器 - 编排层
//!
//! ## 职责
//!
//! 在一个已建立的节点连接上，按应用分组依次处理配置。
//!
//! ## 核心功能
//!
//! 1. **应用分组**：同一应用的配置只解析一次应用、打开一次会话
//! 2. **跳过缺失应用**：找不到的应用只跳过该应用组，不影响其他应用
//! 3. **会话释放**：无论配置成功与否，处理完应用组后都关闭会话
//! 4. **顺序执行**：同一会话上一次只处理一个配置，选择状态不需要加锁

use tracing::warn;

use crate::infrastructure::{AppSession, EngineConnection, SessionIdentity};
use crate::models::Configuration;
use crate::orchestrator::cancel::CancelToken;
use crate::reporter::WarmReporter;
use crate::services::group_by_app;
use crate::workflow::{ConfigurationCtx, ConfigurationFlow};

/// 配置处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppStats {
    /// 预热成功的配置数
    pub warmed: usize,
    /// 回放或预热失败的配置数
    pub failed: usize,
    /// 因应用或节点不可用而未处理的配置数
    pub skipped: usize,
    /// 被跳过的应用组数
    pub skipped_apps: usize,
    pub cancelled: bool,
}

impl AppStats {
    pub fn absorb(&mut self, other: AppStats) {
        self.warmed += other.warmed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.skipped_apps += other.skipped_apps;
        self.cancelled |= other.cancelled;
    }

    fn skip_app(&mut self, configurations: usize) {
        self.skipped_apps += 1;
        self.skipped += configurations;
    }
}

/// 处理一个节点上的所有配置
pub async fn warm_node<C, R>(
    connection: &C,
    configurations: Vec<Configuration>,
    flow: &ConfigurationFlow,
    reporter: &R,
    cancel: &CancelToken,
) -> AppStats
where
    C: EngineConnection,
    R: WarmReporter + ?Sized,
{
    let mut stats = AppStats::default();

    for group in group_by_app(configurations) {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            break;
        }

        let app_key = group.key.as_deref();
        let total = group.configurations.len();
        reporter.app_started(app_key);

        let Some(app_id) = app_key else {
            reporter.app_skipped(None, "URL中缺少 appid 参数");
            stats.skip_app(total);
            continue;
        };

        let identifier = match connection.find_app(app_id).await {
            Ok(Some(identifier)) => identifier,
            Ok(None) => {
                reporter.app_skipped(Some(app_id), "应用不存在");
                stats.skip_app(total);
                continue;
            }
            Err(e) => {
                reporter.app_skipped(Some(app_id), &format!("查找应用失败: {}", e));
                stats.skip_app(total);
                continue;
            }
        };

        let session = match connection.open_app(&identifier, &SessionIdentity::random()).await {
            Ok(session) => session,
            Err(e) => {
                reporter.app_skipped(Some(app_id), &format!("打开会话失败: {}", e));
                stats.skip_app(total);
                continue;
            }
        };

        let app_stats = warm_app(&session, app_id, &group.configurations, flow, reporter, cancel).await;

        if let Err(e) = session.close().await {
            warn!("    - ⚠️ 关闭应用 {} 的会话失败: {}", app_id, e);
        }

        stats.absorb(app_stats);
        if app_stats.cancelled {
            break;
        }
        reporter.app_completed(app_id);
    }

    stats
}

/// 在一个打开的会话上依次处理配置
async fn warm_app<A, R>(
    session: &A,
    app_id: &str,
    configurations: &[Configuration],
    flow: &ConfigurationFlow,
    reporter: &R,
    cancel: &CancelToken,
) -> AppStats
where
    A: AppSession,
    R: WarmReporter + ?Sized,
{
    let mut stats = AppStats::default();
    let total = configurations.len();
    reporter.configurations_applying(total);

    for (index, configuration) in configurations.iter().enumerate() {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            break;
        }

        let ctx = ConfigurationCtx::new(
            app_id.to_string(),
            index + 1,
            total,
            configuration.source.clone(),
        );

        match flow.run(session, configuration, &ctx, reporter).await {
            Ok(_) => stats.warmed += 1,
            Err(e) => {
                reporter.configuration_failed(&ctx, &e);
                stats.failed += 1;
            }
        }
    }

    stats
}
