use thiserror::Error;

/// 单个配置处理失败的原因
///
/// 输入文件和配置文件的错误在入口处直接转成 `anyhow`，不经过这里
#[derive(Debug, Error)]
pub enum AppError {
    /// 选择回放错误
    #[error("选择回放错误: {0}")]
    Replay(#[from] ReplayError),
    /// 缓存预热错误
    #[error("缓存预热错误: {0}")]
    Warm(#[from] WarmError),
}

/// URL 解析错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// URL 本身无法解析
    #[error("无效的URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// 查询参数不是 key=value 形式
    #[error("URL中存在不支持的空查询参数 '{token}': {url}")]
    MalformedQuery { url: String, token: String },
}

/// 引擎调用错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 建立连接失败
    #[error("无法连接到引擎 ({endpoint}): {reason}")]
    ConnectionFailed { endpoint: String, reason: String },
    /// 连接已关闭
    #[error("引擎连接已关闭")]
    ChannelClosed,
    /// 请求超时
    #[error("引擎请求超时: {method}")]
    Timeout { method: String },
    /// 引擎返回 JSON-RPC 错误
    #[error("引擎返回错误 ({method}): code={code}, message={message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    /// 引擎返回的数据结构不符合预期
    #[error("引擎响应格式错误 ({method}): {detail}")]
    UnexpectedResponse { method: String, detail: String },
    /// 对象不存在
    #[error("对象不存在: {id}")]
    ObjectNotFound { id: String },
    /// 序列化失败
    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 选择回放错误
#[derive(Debug, Error)]
pub enum ReplayError {
    /// 应用中不存在该字段
    #[error("字段不存在: {field}")]
    FieldNotFound { field: String },
    /// 引擎调用失败
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// 缓存预热错误
#[derive(Debug, Error)]
pub enum WarmError {
    /// 配置中没有 sheet 参数
    #[error("配置中缺少 sheet 参数")]
    MissingSheet,
    /// 定位 sheet 或子对象失败
    #[error("无法定位对象: {0}")]
    Locate(#[source] EngineError),
    /// 部分对象的 layout 计算失败
    #[error("{failed}/{total} 个对象未能返回 layout: {}", .failures.join("; "))]
    Incomplete {
        failed: usize,
        total: usize,
        failures: Vec<String>,
    },
    /// 整批请求超时
    #[error("预热超时 ({seconds} 秒, {total} 个对象)")]
    TimedOut { seconds: u64, total: usize },
}

/// 输入文件错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {reason}")]
    ReadFailed { path: String, reason: String },
    /// 工作簿中没有工作表
    #[error("工作簿中没有工作表: {path}")]
    NoWorksheet { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl EngineError {
    /// 创建连接失败错误
    pub fn connection_failed(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        EngineError::ConnectionFailed {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建响应格式错误
    pub fn unexpected(method: impl Into<String>, detail: impl Into<String>) -> Self {
        EngineError::UnexpectedResponse {
            method: method.into(),
            detail: detail.into(),
        }
    }
}

impl InputError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        InputError::ReadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 引擎调用结果类型
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_failures_keep_their_stage() {
        let replay: AppError = ReplayError::FieldNotFound {
            field: "Region".into(),
        }
        .into();
        assert!(matches!(replay, AppError::Replay(_)));
        assert!(replay.to_string().contains("Region"));

        let warm: AppError = WarmError::MissingSheet.into();
        assert!(matches!(warm, AppError::Warm(WarmError::MissingSheet)));
    }
}
