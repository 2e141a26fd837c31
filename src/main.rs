use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

use qlik_cache_warmer::config::CONFIG_FILE_NAME;
use qlik_cache_warmer::utils::logging;
use qlik_cache_warmer::{App, Config};

/// 回放视图URL，预热分析引擎的计算缓存
#[derive(Debug, Parser)]
#[command(name = "qlik_cache_warmer", version)]
struct Cli {
    /// 包含视图URL的表格文件（xlsx / xls / ods）
    input: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 加载配置
    let config = match Config::load_or_default(Path::new(CONFIG_FILE_NAME)) {
        Ok(config) => config,
        Err(e) => {
            logging::init(false);
            error!("❌ {}", e);
            return ExitCode::from(2);
        }
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config, cli.input);

    let cancel = app.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl-C，当前配置完成后停止");
            cancel.cancel();
        }
    });

    match app.run().await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}
