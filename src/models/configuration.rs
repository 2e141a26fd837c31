//! 视图配置 - 由一条 single 视图 URL 解析而来
//!
//! URL 形如：
//!
//! ```text
//! https://host/<proxy>/single?appid=<id>&sheet=<id>&select=<Field,Value1,Value2>[&select=...]
//! ```

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::ParseError;
use crate::models::selection::Selection;

/// 路径中分隔虚拟代理和视图的标记
const VIEW_MARKER: &str = "single";

/// 单个视图配置
///
/// 完全由源 URL 决定，构造过程不做任何 I/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// 源 URL（仅用于日志）
    pub source: String,
    /// scheme://host[:port]
    pub server_uri: String,
    /// 虚拟代理路径，去掉首尾的 `/`，根代理为空串
    pub virtual_proxy: String,
    pub app_id: Option<String>,
    pub sheet_id: Option<String>,
    /// 按 URL 中出现的顺序保存
    pub selections: Vec<Selection>,
}

impl Configuration {
    /// 解析字符串形式的 URL
    pub fn parse(uri: &str) -> Result<Self, ParseError> {
        let url = Url::parse(uri).map_err(|e| ParseError::InvalidUrl {
            url: uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(&url)
    }

    /// 从已解析的 URL 构建配置
    pub fn from_url(url: &Url) -> Result<Self, ParseError> {
        let host = url.host_str().ok_or_else(|| ParseError::InvalidUrl {
            url: url.to_string(),
            reason: "缺少主机名".to_string(),
        })?;

        let server_uri = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let mut configuration = Self {
            source: url.to_string(),
            server_uri,
            virtual_proxy: virtual_proxy_of(url.path()),
            app_id: None,
            sheet_id: None,
            selections: Vec::new(),
        };

        let query = url.query().unwrap_or_default();
        if query.is_empty() {
            return Ok(configuration);
        }

        for token in query.split('&') {
            let (key, value) = match token.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => (key, value),
                _ => {
                    return Err(ParseError::MalformedQuery {
                        url: url.to_string(),
                        token: token.to_string(),
                    })
                }
            };

            match key {
                "appid" => configuration.app_id = Some(value.to_string()),
                "sheet" => configuration.sheet_id = Some(value.to_string()),
                "select" => {
                    if let Some(selection) = Selection::from_query_value(value) {
                        configuration.selections.push(selection);
                    }
                }
                // 未识别的参数忽略
                _ => {}
            }
        }

        Ok(configuration)
    }

    /// 节点分组键（服务器 + 虚拟代理）
    pub fn node_key(&self) -> NodeKey {
        NodeKey {
            server_uri: self.server_uri.clone(),
            virtual_proxy: self.virtual_proxy.clone(),
        }
    }

    /// 应用分组键
    pub fn app_key(&self) -> Option<String> {
        self.app_id.clone()
    }
}

/// 取路径中 `single` 之前的部分作为虚拟代理
///
/// 路径中没有 `single` 时，整个路径都视为虚拟代理
fn virtual_proxy_of(raw_path: &str) -> String {
    let path = percent_decode_str(raw_path).decode_utf8_lossy();
    let prefix = match path.find(VIEW_MARKER) {
        Some(index) => &path[..index],
        None => &path[..],
    };
    prefix.trim_matches('/').to_string()
}

/// 节点：服务器地址 + 虚拟代理
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub server_uri: String,
    pub virtual_proxy: String,
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server_uri, self.virtual_proxy)
    }
}
