//! 配置处理流程 - 流程层
//!
//! 核心职责：定义"一个配置"的完整预热流程
//!
//! 流程顺序：
//! 1. 选择回放（清空 → 按顺序选择）
//! 2. 定位 sheet 及子对象
//! 3. 并发请求 layout

use std::time::Duration;

use crate::config::Config;
use crate::error::{AppResult, WarmError};
use crate::infrastructure::AppSession;
use crate::models::Configuration;
use crate::reporter::WarmReporter;
use crate::services::{apply_configuration, locate_sheet, warm, WarmReport};
use crate::workflow::configuration_ctx::ConfigurationCtx;

/// 配置处理流程
///
/// - 不持有任何资源（会话由编排层打开和关闭）
/// - 只依赖业务能力（services）
#[derive(Debug, Clone)]
pub struct ConfigurationFlow {
    layout_timeout: Option<Duration>,
}

impl ConfigurationFlow {
    /// 创建新的配置处理流程
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(config.layout_timeout())
    }

    pub fn with_timeout(layout_timeout: Option<Duration>) -> Self {
        Self { layout_timeout }
    }

    pub async fn run<A, R>(
        &self,
        app: &A,
        configuration: &Configuration,
        ctx: &ConfigurationCtx,
        reporter: &R,
    ) -> AppResult<WarmReport>
    where
        A: AppSession,
        R: WarmReporter + ?Sized,
    {
        apply_configuration(app, configuration, reporter).await?;

        let sheet_id = configuration
            .sheet_id
            .as_deref()
            .ok_or(WarmError::MissingSheet)?;

        let (sheet, children) = locate_sheet(app, sheet_id)
            .await
            .map_err(WarmError::Locate)?;

        reporter.warming_started(ctx);
        let report = warm(&sheet, &children, self.layout_timeout).await?;
        reporter.warming_done(ctx, &report);

        Ok(report)
    }
}
