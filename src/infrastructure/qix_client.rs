//! QIX 引擎客户端 - 基础设施层
//!
//! 通过引擎的 JSON-RPC WebSocket 接口实现 `engine` 中的能力 trait。
//! 全局连接指向 `/app/engineData`，每个应用会话单独建立一个 socket。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::infrastructure::engine::{
    AppIdentifier, AppSession, EngineClient, EngineConnection, FieldHandle, GenericObject,
    Location, SessionIdentity,
};
use crate::infrastructure::rpc_channel::{ChannelTimeouts, RpcChannel};
use crate::models::FieldValue;

/// 全局对象的句柄
const GLOBAL_HANDLE: i64 = -1;

/// 全局连接使用的虚拟应用名
const GLOBAL_TARGET: &str = "engineData";

/// QIX 引擎客户端
#[derive(Debug, Clone)]
pub struct QixEngineClient {
    timeouts: ChannelTimeouts,
}

impl QixEngineClient {
    pub fn new(timeouts: ChannelTimeouts) -> Self {
        Self { timeouts }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ChannelTimeouts {
            connect: config.connect_timeout(),
            request: config.request_timeout(),
        })
    }
}

#[async_trait]
impl EngineClient for QixEngineClient {
    type Connection = QixConnection;

    async fn connect(&self, location: &Location) -> EngineResult<QixConnection> {
        let endpoint = endpoint_for(location, GLOBAL_TARGET)?;
        let global = RpcChannel::open(&endpoint, location, self.timeouts).await?;

        if location.version_check {
            let version = global.call(GLOBAL_HANDLE, "EngineVersion", json!({})).await?;
            info!(
                "引擎版本: {}",
                version["qVersion"]["qComponentVersion"]
                    .as_str()
                    .unwrap_or("unknown")
            );
        }

        Ok(QixConnection {
            location: location.clone(),
            timeouts: self.timeouts,
            global,
        })
    }
}

/// 节点连接（全局 socket）
pub struct QixConnection {
    location: Location,
    timeouts: ChannelTimeouts,
    global: RpcChannel,
}

#[derive(Debug, Deserialize)]
struct DocListEntry {
    #[serde(rename = "qDocId")]
    doc_id: String,
    #[serde(rename = "qDocName", default)]
    doc_name: String,
}

#[async_trait]
impl EngineConnection for QixConnection {
    type Session = QixApp;

    async fn find_app(&self, app_id: &str) -> EngineResult<Option<AppIdentifier>> {
        let result = self.global.call(GLOBAL_HANDLE, "GetDocList", json!({})).await?;
        let docs: Vec<DocListEntry> = serde_json::from_value(result["qDocList"].clone())?;
        debug!("节点 {} 上共有 {} 个应用", self.location, docs.len());

        Ok(docs
            .into_iter()
            .find(|doc| doc.doc_id.eq_ignore_ascii_case(app_id))
            .map(|doc| AppIdentifier {
                id: doc.doc_id,
                name: doc.doc_name,
            }))
    }

    async fn open_app(
        &self,
        app: &AppIdentifier,
        identity: &SessionIdentity,
    ) -> EngineResult<QixApp> {
        let target = format!("{}/identity/{}", app.id, identity.0);
        let endpoint = endpoint_for(&self.location, &target)?;
        let channel = Arc::new(RpcChannel::open(&endpoint, &self.location, self.timeouts).await?);

        let opened = channel
            .call(GLOBAL_HANDLE, "OpenDoc", json!({ "qDocName": app.id }))
            .await
            .and_then(|result| {
                handle_of(&result).ok_or_else(|| EngineError::unexpected("OpenDoc", "缺少 qHandle"))
            });

        match opened {
            Ok(handle) => Ok(QixApp {
                app_id: app.id.clone(),
                handle,
                channel,
            }),
            Err(e) => {
                // 打开失败也要释放 socket
                let _ = channel.close().await;
                Err(e)
            }
        }
    }

    async fn close(self) -> EngineResult<()> {
        self.global.close().await
    }
}

/// 应用会话
pub struct QixApp {
    app_id: String,
    handle: i64,
    channel: Arc<RpcChannel>,
}

#[async_trait]
impl AppSession for QixApp {
    type Object = QixObject;

    async fn clear_all(&self) -> EngineResult<()> {
        self.channel
            .call(self.handle, "ClearAll", json!({ "qLockedAlso": false }))
            .await?;
        Ok(())
    }

    async fn field(&self, name: &str) -> EngineResult<Option<FieldHandle>> {
        let result = self
            .channel
            .call(self.handle, "GetField", json!({ "qFieldName": name }))
            .await?;
        Ok(handle_of(&result).map(|handle| FieldHandle {
            name: name.to_string(),
            handle,
        }))
    }

    async fn select_values(&self, field: &FieldHandle, values: &[FieldValue]) -> EngineResult<bool> {
        let field_values: Vec<JsonValue> = values.iter().map(field_value_json).collect();
        let result = self
            .channel
            .call(
                field.handle,
                "SelectValues",
                json!({
                    "qFieldValues": field_values,
                    "qToggleMode": false,
                    "qSoftLock": false,
                }),
            )
            .await?;
        Ok(result["qReturn"].as_bool().unwrap_or(false))
    }

    async fn object(&self, id: &str) -> EngineResult<QixObject> {
        let result = self
            .channel
            .call(self.handle, "GetObject", json!({ "qId": id }))
            .await?;
        let handle = handle_of(&result).ok_or_else(|| EngineError::ObjectNotFound { id: id.to_string() })?;
        Ok(QixObject {
            id: id.to_string(),
            handle,
            channel: self.channel.clone(),
        })
    }

    async fn close(self) -> EngineResult<()> {
        debug!("关闭应用会话: {}", self.app_id);
        self.channel.close().await
    }
}

/// sheet 或可视化对象
pub struct QixObject {
    id: String,
    handle: i64,
    channel: Arc<RpcChannel>,
}

#[derive(Debug, Deserialize)]
struct ChildInfo {
    #[serde(rename = "qId")]
    id: String,
}

#[async_trait]
impl GenericObject for QixObject {
    fn id(&self) -> &str {
        &self.id
    }

    async fn child_ids(&self) -> EngineResult<Vec<String>> {
        let result = self.channel.call(self.handle, "GetChildInfos", json!({})).await?;
        let infos: Vec<ChildInfo> = serde_json::from_value(result["qInfos"].clone())?;
        Ok(infos.into_iter().map(|info| info.id).collect())
    }

    async fn layout(&self) -> EngineResult<JsonValue> {
        let mut result = self.channel.call(self.handle, "GetLayout", json!({})).await?;
        match result.get_mut("qLayout") {
            Some(layout) => Ok(layout.take()),
            None => Err(EngineError::unexpected("GetLayout", "缺少 qLayout")),
        }
    }
}

/// 拼出 `ws(s)://host[:port]/<proxy>/app/<target>`
fn endpoint_for(location: &Location, target: &str) -> EngineResult<String> {
    let mut url = Url::parse(&location.server_uri)
        .map_err(|e| EngineError::connection_failed(&location.server_uri, e))?;

    let ws_scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(ws_scheme).map_err(|_| {
        EngineError::connection_failed(&location.server_uri, "无法转换为 WebSocket 地址")
    })?;

    let proxy = location.virtual_proxy.trim_matches('/');
    let path = if proxy.is_empty() {
        format!("/app/{}", target)
    } else {
        format!("/{}/app/{}", proxy, target)
    };
    url.set_path(&path);

    Ok(url.to_string())
}

fn handle_of(result: &JsonValue) -> Option<i64> {
    result["qReturn"]["qHandle"].as_i64()
}

fn field_value_json(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Numeric(number) => json!({ "qIsNumeric": true, "qNumber": number }),
        FieldValue::Text(text) => json!({ "qIsNumeric": false, "qText": text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::engine::AuthMode;

    #[test]
    fn builds_secure_endpoint_with_proxy() {
        let location = Location::trusted("https://qlik.example.com", "hub", AuthMode::Anonymous);
        assert_eq!(
            endpoint_for(&location, "engineData").unwrap(),
            "wss://qlik.example.com/hub/app/engineData"
        );
    }

    #[test]
    fn builds_plain_endpoint_for_root_proxy() {
        let location = Location::trusted("http://qlik:4848", "", AuthMode::Anonymous);
        assert_eq!(
            endpoint_for(&location, "A1/identity/abc").unwrap(),
            "ws://qlik:4848/app/A1/identity/abc"
        );
    }

    #[test]
    fn field_values_carry_numeric_flag() {
        assert_eq!(
            field_value_json(&FieldValue::Numeric(2024.0)),
            json!({ "qIsNumeric": true, "qNumber": 2024.0 })
        );
        assert_eq!(
            field_value_json(&FieldValue::Text("East".into())),
            json!({ "qIsNumeric": false, "qText": "East" })
        );
    }
}
