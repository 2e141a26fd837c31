//! 预热处理器 - 编排层
//!
//! ## 职责
//!
//! 顶层状态机：`开始 → 节点 → 应用 → 配置 → 结束`
//!
//! ## 核心功能
//!
//! 1. **解析**：把 URL 转成配置，无法解析的报告后跳过
//! 2. **节点分组**：每个节点（服务器 + 虚拟代理）只建立一次连接
//! 3. **连接释放**：节点处理完毕后无论成败都关闭连接
//! 4. **全局统计**：汇总所有配置的处理结果
//!
//! ## 设计特点
//!
//! - **单控制流**：节点、应用、配置依次处理，只有单个配置的 layout 请求是并发的
//! - **向下委托**：委托 app_processor 处理节点内的应用组

use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::infrastructure::{AuthMode, EngineClient, EngineConnection, Location};
use crate::models::Configuration;
use crate::orchestrator::app_processor::{self, AppStats};
use crate::orchestrator::cancel::CancelToken;
use crate::reporter::WarmReporter;
use crate::services::group_by_node;
use crate::workflow::ConfigurationFlow;

/// 整次运行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 成功解析的配置总数
    pub total: usize,
    /// 无法解析的 URL 数
    pub unparsed: usize,
    pub warmed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub skipped_apps: usize,
    pub cancelled: bool,
}

impl RunSummary {
    /// 所有 URL 都解析成功且所有配置都预热成功
    pub fn is_success(&self) -> bool {
        self.unparsed == 0
            && self.failed == 0
            && self.skipped == 0
            && !self.cancelled
            && self.warmed == self.total
    }

    fn absorb(&mut self, stats: AppStats) {
        self.warmed += stats.warmed;
        self.failed += stats.failed;
        self.skipped += stats.skipped;
        self.skipped_apps += stats.skipped_apps;
        self.cancelled |= stats.cancelled;
    }
}

/// 缓存预热编排器
pub struct Warmer<E, R> {
    engine: E,
    reporter: R,
    flow: ConfigurationFlow,
    auth: AuthMode,
    cancel: CancelToken,
}

impl<E, R> Warmer<E, R>
where
    E: EngineClient,
    R: WarmReporter,
{
    pub fn new(engine: E, reporter: R, config: &Config) -> Self {
        Self {
            engine,
            reporter,
            flow: ConfigurationFlow::new(config),
            auth: config.auth.clone(),
            cancel: CancelToken::new(),
        }
    }

    /// 使用外部的取消标记
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// 解析 URL 并预热
    pub async fn run_urls(&self, urls: impl IntoIterator<Item = Url>) -> RunSummary {
        let mut unparsed = 0;
        let mut configurations = Vec::new();

        for url in urls {
            match Configuration::from_url(&url) {
                Ok(configuration) => configurations.push(configuration),
                Err(e) => {
                    self.reporter.configuration_unparsed(url.as_str(), &e);
                    unparsed += 1;
                }
            }
        }

        let mut summary = self.run(configurations).await;
        summary.unparsed = unparsed;
        summary
    }

    /// 按节点依次预热所有配置
    pub async fn run(&self, configurations: Vec<Configuration>) -> RunSummary {
        let mut summary = RunSummary {
            total: configurations.len(),
            ..Default::default()
        };

        for node in group_by_node(configurations) {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let count = node.configurations.len();
            self.reporter.node_started(&node.key, count);

            let location = Location::trusted(
                node.key.server_uri.clone(),
                node.key.virtual_proxy.clone(),
                self.auth.clone(),
            );

            let connection = match self.engine.connect(&location).await {
                Ok(connection) => connection,
                Err(e) => {
                    self.reporter.node_skipped(&node.key, &e);
                    summary.skipped += count;
                    continue;
                }
            };

            let stats = app_processor::warm_node(
                &connection,
                node.configurations,
                &self.flow,
                &self.reporter,
                &self.cancel,
            )
            .await;

            if let Err(e) = connection.close().await {
                warn!("⚠️ 关闭节点 {} 的连接失败: {}", node.key, e);
            }

            summary.absorb(stats);
            self.reporter.node_completed(&node.key);
        }

        if summary.cancelled {
            self.reporter.cancelled();
        }

        summary
    }
}
