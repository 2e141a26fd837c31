use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::QixEngineClient;
use crate::models::load_uris_from_spreadsheet;
use crate::orchestrator::{CancelToken, RunSummary, Warmer};
use crate::reporter::TracingReporter;
use crate::utils::logging::{log_startup, log_urls_loaded, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    input: PathBuf,
    cancel: CancelToken,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, input: PathBuf) -> Self {
        Self {
            config,
            input,
            cancel: CancelToken::new(),
        }
    }

    /// 取消标记（用于 Ctrl-C）
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    ///
    /// 输入文件不可读时返回错误，单个配置的失败只体现在统计中
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Local::now();
        log_startup(&self.input, started_at);

        info!("\n📁 正在读取输入文件...");
        let urls = load_uris_from_spreadsheet(&self.input)
            .await
            .with_context(|| format!("无法读取输入文件: {}", self.input.display()))?;

        if urls.is_empty() {
            warn!("⚠️ 输入文件中没有找到任何URL，程序结束");
            return Ok(RunSummary::default());
        }
        log_urls_loaded(urls.len());

        let warmer = Warmer::new(
            QixEngineClient::from_config(&self.config),
            TracingReporter,
            &self.config,
        )
        .with_cancel_token(self.cancel.clone());

        let summary = warmer.run_urls(urls).await;

        print_final_stats(&summary, started_at);

        Ok(summary)
    }
}
