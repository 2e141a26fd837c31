//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分组和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `warm_processor` - 预热处理器
//! - 解析 URL，报告无法解析的条目
//! - 按节点分组，每个节点建立并释放一次连接
//! - 输出全局统计信息（RunSummary）
//!
//! ### `app_processor` - 节点内的应用处理器
//! - 按应用分组，解析应用、打开并释放会话
//! - 依次执行每个配置的 ConfigurationFlow
//! - 找不到的应用只跳过该应用组
//!
//! ### `cancel` - 协作式取消
//!
//! ## 层次关系
//!
//! ```text
//! warm_processor (处理 Vec<NodeGroup>)
//!     ↓
//! app_processor (处理 Vec<AppGroup>)
//!     ↓
//! workflow::ConfigurationFlow (处理单个 Configuration)
//!     ↓
//! services (能力层：replay / warm)
//!     ↓
//! infrastructure (基础设施：EngineClient)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：warm_processor 管节点，app_processor 管应用
//! 2. **资源隔离**：只有编排层打开和关闭连接、会话
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app_processor;
pub mod cancel;
pub mod warm_processor;

// 重新导出主要类型
pub use app_processor::AppStats;
pub use cancel::CancelToken;
pub use warm_processor::{RunSummary, Warmer};
