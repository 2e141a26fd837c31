//! JSON-RPC 通道 - 基础设施层
//!
//! 一个 WebSocket 连接上复用多个并发请求：
//! 请求 id 单调递增，响应由后台读取任务按 id 分发给等待方。

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::infrastructure::engine::{AuthMode, Location};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingTable = Arc<Mutex<HashMap<u64, oneshot::Sender<RpcReply>>>>;
type RpcReply = Result<JsonValue, RpcFailure>;

/// 引擎返回的错误对象
#[derive(Debug, Clone, Deserialize)]
struct RpcFailure {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// 引擎推送的响应或通知
#[derive(Debug, Deserialize)]
struct Incoming {
    id: Option<u64>,
    method: Option<String>,
    result: Option<JsonValue>,
    error: Option<RpcFailure>,
}

/// 通道超时设置，`None` 表示不限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTimeouts {
    /// WebSocket 握手
    pub connect: Option<Duration>,
    /// 单个请求从发送到收到响应
    pub request: Option<Duration>,
}

/// JSON-RPC 通道
pub struct RpcChannel {
    endpoint: String,
    request_timeout: Option<Duration>,
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: PendingTable,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl RpcChannel {
    /// 建立 WebSocket 连接并启动读取任务
    pub async fn open(
        endpoint: &str,
        location: &Location,
        timeouts: ChannelTimeouts,
    ) -> EngineResult<Self> {
        debug!("正在连接引擎: {}", endpoint);

        let mut request = endpoint
            .into_client_request()
            .map_err(|e| EngineError::connection_failed(endpoint, e))?;

        if let AuthMode::Header { name, value } = &location.auth {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| EngineError::connection_failed(endpoint, e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| EngineError::connection_failed(endpoint, e))?;
            request.headers_mut().insert(name, value);
        }

        let connector = tls_connector(location.certificate_validation)
            .map_err(|e| EngineError::connection_failed(endpoint, e))?;

        let connecting = connect_async_tls_with_config(request, None, false, Some(connector));
        let (stream, _response) = bounded(timeouts.connect, connecting)
            .await
            .ok_or_else(|| EngineError::Timeout {
                method: format!("connect {}", endpoint),
            })?
            .map_err(|e| EngineError::connection_failed(endpoint, e))?;

        let (sink, source) = stream.split();
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_loop(
            source,
            pending.clone(),
            closed.clone(),
            endpoint.to_string(),
        ));

        debug!("引擎连接成功: {}", endpoint);

        Ok(Self {
            endpoint: endpoint.to_string(),
            request_timeout: timeouts.request,
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            closed,
            reader,
        })
    }

    /// 发送请求并等待对应 id 的响应
    pub async fn call(&self, handle: i64, method: &str, params: JsonValue) -> EngineResult<JsonValue> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        // 读取任务已退出时不会再有人清理这条记录
        if self.closed.load(Ordering::SeqCst) {
            self.pending.lock().await.remove(&id);
            return Err(EngineError::ChannelClosed);
        }

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "handle": handle,
            "method": method,
            "params": params,
        });
        debug!("→ #{} {} (handle {})", id, method, handle);

        let sent = self
            .sink
            .lock()
            .await
            .send(Message::Text(request.to_string()))
            .await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            warn!("发送请求失败 ({}): {}", method, e);
            return Err(EngineError::ChannelClosed);
        }

        let reply = await_reply(rx, method, self.request_timeout).await;
        if let Err(EngineError::Timeout { .. }) = &reply {
            // 迟到的响应会被读取任务当作无人等待而丢弃
            self.pending.lock().await.remove(&id);
            warn!("引擎请求超时 ({}): #{}", method, id);
        }
        reply
    }

    /// 发送关闭帧并停止读取任务
    pub async fn close(&self) -> EngineResult<()> {
        let result = self.sink.lock().await.close().await;
        self.reader.abort();
        self.closed.store(true, Ordering::SeqCst);
        self.pending.lock().await.clear();
        debug!("引擎连接已关闭: {}", self.endpoint);
        result.map_err(|e| EngineError::connection_failed(&self.endpoint, e))
    }
}

impl Drop for RpcChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut source: futures::stream::SplitStream<WsStream>,
    pending: PendingTable,
    closed: Arc<AtomicBool>,
    endpoint: String,
) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch(&pending, &text).await,
            Ok(Message::Close(frame)) => {
                debug!("引擎关闭了连接 ({}): {:?}", endpoint, frame);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("读取引擎消息失败 ({}): {}", endpoint, e);
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    // 丢弃所有等待中的 sender，等待方会收到 ChannelClosed
    pending.lock().await.clear();
}

async fn dispatch(pending: &PendingTable, text: &str) {
    let incoming: Incoming = match serde_json::from_str(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            warn!("无法解析引擎消息: {}", e);
            return;
        }
    };

    let Some(id) = incoming.id else {
        // 通知（OnConnected 等）
        debug!("← 通知 {:?}", incoming.method);
        return;
    };

    let Some(tx) = pending.lock().await.remove(&id) else {
        debug!("← #{} 没有等待方，忽略", id);
        return;
    };

    let reply = match incoming.error {
        Some(failure) => Err(failure),
        None => Ok(incoming.result.unwrap_or(JsonValue::Null)),
    };
    debug!("← #{} {}", id, if reply.is_ok() { "ok" } else { "error" });
    let _ = tx.send(reply);
}

/// 在可选的时间限制内等待 future，超时返回 `None`
async fn bounded<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

async fn await_reply(
    rx: oneshot::Receiver<RpcReply>,
    method: &str,
    limit: Option<Duration>,
) -> EngineResult<JsonValue> {
    let received = bounded(limit, rx).await.ok_or_else(|| EngineError::Timeout {
        method: method.to_string(),
    })?;

    match received {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(failure)) => Err(EngineError::Rpc {
            method: method.to_string(),
            code: failure.code,
            message: failure.message,
        }),
        Err(_) => Err(EngineError::ChannelClosed),
    }
}

fn tls_connector(certificate_validation: bool) -> Result<Connector, native_tls::Error> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(!certificate_validation)
        .danger_accept_invalid_hostnames(!certificate_validation)
        .build()?;
    Ok(Connector::NativeTls(connector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let (_tx, rx) = oneshot::channel::<RpcReply>();

        let result = await_reply(rx, "GetDocList", Some(Duration::from_secs(5))).await;
        assert!(
            matches!(&result, Err(EngineError::Timeout { method }) if method == "GetDocList"),
            "{:?}",
            result
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_limit_waits_for_the_reply() {
        let (tx, rx) = oneshot::channel::<RpcReply>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(Ok(json!({ "qReturn": true })));
        });

        let result = await_reply(rx, "ClearAll", None).await;
        assert_eq!(result.ok(), Some(json!({ "qReturn": true })));
    }

    #[tokio::test]
    async fn engine_error_and_dropped_sender_are_reported() {
        let (tx, rx) = oneshot::channel::<RpcReply>();
        let _ = tx.send(Err(RpcFailure {
            code: 2,
            message: "Invalid handle".into(),
        }));
        let result = await_reply(rx, "GetField", Some(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(EngineError::Rpc { code: 2, .. })));

        let (tx, rx) = oneshot::channel::<RpcReply>();
        drop(tx);
        let result = await_reply(rx, "GetField", Some(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(EngineError::ChannelClosed)));
    }
}
