//! 配置处理上下文
//!
//! 封装"我正在处理哪个应用的第几个配置"这一信息

use std::fmt::Display;

/// 配置处理上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationCtx {
    /// 应用 ID
    pub app_id: String,

    /// 配置在应用组中的索引（从1开始）
    pub index: usize,

    /// 应用组中的配置总数
    pub total: usize,

    /// 源 URL（仅用于日志显示）
    pub source: String,
}

impl ConfigurationCtx {
    /// 创建新的配置上下文
    pub fn new(app_id: String, index: usize, total: usize, source: String) -> Self {
        Self {
            app_id,
            index,
            total,
            source,
        }
    }
}

impl Display for ConfigurationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[应用 {} 配置 {}/{}]", self.app_id, self.index, self.total)
    }
}
