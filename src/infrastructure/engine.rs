//! 引擎能力接口 - 基础设施层
//!
//! 编排层只依赖这里的 trait，不关心底层传输方式。
//! 资源层级：连接（节点） → 会话（应用） → 对象（sheet / 可视化）

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::EngineResult;
use crate::models::FieldValue;

/// 认证方式，由运维人员在配置文件中指定
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthMode {
    /// 不附加任何认证信息
    #[default]
    Anonymous,
    /// 通过虚拟代理的 header 认证
    Header { name: String, value: String },
}

/// 连接目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// scheme://host[:port]
    pub server_uri: String,
    pub virtual_proxy: String,
    /// 是否校验引擎版本
    pub version_check: bool,
    /// 是否校验 TLS 证书
    pub certificate_validation: bool,
    pub auth: AuthMode,
}

impl Location {
    /// 预热使用的连接参数：关闭版本检查和证书校验
    pub fn trusted(server_uri: impl Into<String>, virtual_proxy: impl Into<String>, auth: AuthMode) -> Self {
        Self {
            server_uri: server_uri.into(),
            virtual_proxy: virtual_proxy.into(),
            version_check: false,
            certificate_validation: false,
            auth,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server_uri, self.virtual_proxy)
    }
}

/// 已解析的应用标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentifier {
    pub id: String,
    pub name: String,
}

/// 会话身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(pub String);

impl SessionIdentity {
    /// 随机身份，会话不会在多次运行之间复用
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// 字段句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHandle {
    pub name: String,
    pub handle: i64,
}

/// 引擎客户端：负责建立节点连接
#[async_trait]
pub trait EngineClient: Send + Sync {
    type Connection: EngineConnection;

    async fn connect(&self, location: &Location) -> EngineResult<Self::Connection>;
}

/// 节点连接
#[async_trait]
pub trait EngineConnection: Send + Sync {
    type Session: AppSession;

    /// 找不到应用时返回 `None`
    async fn find_app(&self, app_id: &str) -> EngineResult<Option<AppIdentifier>>;

    async fn open_app(
        &self,
        app: &AppIdentifier,
        identity: &SessionIdentity,
    ) -> EngineResult<Self::Session>;

    async fn close(self) -> EngineResult<()>;
}

/// 已打开的应用会话
#[async_trait]
pub trait AppSession: Send + Sync {
    type Object: GenericObject;

    async fn clear_all(&self) -> EngineResult<()>;

    /// 找不到字段时返回 `None`
    async fn field(&self, name: &str) -> EngineResult<Option<FieldHandle>>;

    async fn select_values(&self, field: &FieldHandle, values: &[FieldValue]) -> EngineResult<bool>;

    async fn object(&self, id: &str) -> EngineResult<Self::Object>;

    async fn close(self) -> EngineResult<()>;
}

/// 可计算 layout 的通用对象
#[async_trait]
pub trait GenericObject: Send + Sync {
    fn id(&self) -> &str;

    /// 直接子对象的 id（不递归）
    async fn child_ids(&self) -> EngineResult<Vec<String>>;

    async fn layout(&self) -> EngineResult<JsonValue>;
}
