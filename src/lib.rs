//! # Qlik Cache Warmer
//!
//! 一个用于预热分析引擎计算缓存的 Rust 应用程序：
//! 回放之前记录的视图 URL（应用 + sheet + 字段选择），
//! 让部署或数据重载后的用户直接命中缓存。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（连接、会话），只暴露能力
//! - `EngineClient` 等 trait - 编排层依赖的引擎能力
//! - `QixEngineClient` - 基于 JSON-RPC WebSocket 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `grouping` - 按节点 / 应用稳定分组
//! - `selection_replay` - 清空并按顺序回放选择
//! - `cache_warming` - 并发请求 layout，全部成功才算成功
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个配置"的完整处理流程
//! - `ConfigurationCtx` - 上下文封装（应用 + 配置序号）
//! - `ConfigurationFlow` - 流程编排（replay → locate → warm）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/warm_processor` - 节点级处理器，管理连接
//! - `orchestrator/app_processor` - 应用级处理器，管理会话
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod reporter;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::QixEngineClient;
pub use models::{Configuration, FieldValue, Selection};
pub use orchestrator::{CancelToken, RunSummary, Warmer};
pub use reporter::{TracingReporter, WarmReporter};
pub use workflow::{ConfigurationCtx, ConfigurationFlow};
