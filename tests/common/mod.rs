//! 测试用的脚本化引擎
//!
//! 实现引擎能力 trait，记录所有调用，便于断言调用顺序和资源释放

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use qlik_cache_warmer::error::{AppError, EngineError, EngineResult, ParseError};
use qlik_cache_warmer::infrastructure::{
    AppIdentifier, AppSession, EngineClient, EngineConnection, FieldHandle, GenericObject,
    Location, SessionIdentity,
};
use qlik_cache_warmer::models::{FieldValue, NodeKey};
use qlik_cache_warmer::services::WarmReport;
use qlik_cache_warmer::{CancelToken, ConfigurationCtx, WarmReporter};

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// 引擎上存在的应用、字段和对象
#[derive(Debug, Clone, Default)]
pub struct Script {
    apps: HashSet<String>,
    fields: HashSet<String>,
    sheets: HashMap<String, Vec<String>>,
    failing_objects: HashSet<String>,
    slow_objects: HashSet<String>,
    unreachable: HashSet<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(mut self, id: &str) -> Self {
        self.apps.insert(id.to_string());
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string());
        self
    }

    pub fn sheet(mut self, id: &str, children: &[&str]) -> Self {
        self.sheets
            .insert(id.to_string(), children.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn failing(mut self, object_id: &str) -> Self {
        self.failing_objects.insert(object_id.to_string());
        self
    }

    pub fn slow(mut self, object_id: &str) -> Self {
        self.slow_objects.insert(object_id.to_string());
        self
    }

    /// `server_uri/virtual_proxy` 形式
    pub fn unreachable(mut self, node: &str) -> Self {
        self.unreachable.insert(node.to_string());
        self
    }

    fn has_object(&self, id: &str) -> bool {
        self.sheets.contains_key(id) || self.sheets.values().any(|children| children.iter().any(|c| c == id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    script: Arc<Script>,
    log: CallLog,
}

impl MockEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            log: CallLog::default(),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn record(log: &CallLog, call: String) {
    log.lock().unwrap().push(call);
}

#[async_trait]
impl EngineClient for MockEngine {
    type Connection = MockConnection;

    async fn connect(&self, location: &Location) -> EngineResult<MockConnection> {
        assert!(!location.version_check, "version check must be disabled");
        assert!(!location.certificate_validation, "certificate validation must be disabled");

        let node = location.to_string();
        if self.script.unreachable.contains(&node) {
            record(&self.log, format!("connect-failed {}", node));
            return Err(EngineError::connection_failed(node, "connection refused"));
        }

        record(&self.log, format!("connect {}", node));
        Ok(MockConnection {
            node,
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }
}

pub struct MockConnection {
    node: String,
    script: Arc<Script>,
    log: CallLog,
}

#[async_trait]
impl EngineConnection for MockConnection {
    type Session = MockApp;

    async fn find_app(&self, app_id: &str) -> EngineResult<Option<AppIdentifier>> {
        record(&self.log, format!("find_app {}", app_id));
        Ok(self.script.apps.get(app_id).map(|id| AppIdentifier {
            id: id.clone(),
            name: format!("{}.qvf", id),
        }))
    }

    async fn open_app(
        &self,
        app: &AppIdentifier,
        identity: &SessionIdentity,
    ) -> EngineResult<MockApp> {
        assert!(!identity.0.is_empty());
        record(&self.log, format!("open_app {}", app.id));
        Ok(MockApp {
            app_id: app.id.clone(),
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }

    async fn close(self) -> EngineResult<()> {
        record(&self.log, format!("close_connection {}", self.node));
        Ok(())
    }
}

pub struct MockApp {
    app_id: String,
    script: Arc<Script>,
    log: CallLog,
}

#[async_trait]
impl AppSession for MockApp {
    type Object = MockObject;

    async fn clear_all(&self) -> EngineResult<()> {
        record(&self.log, format!("clear_all {}", self.app_id));
        Ok(())
    }

    async fn field(&self, name: &str) -> EngineResult<Option<FieldHandle>> {
        Ok(self.script.fields.contains(name).then(|| FieldHandle {
            name: name.to_string(),
            handle: 7,
        }))
    }

    async fn select_values(&self, field: &FieldHandle, values: &[FieldValue]) -> EngineResult<bool> {
        let rendered: Vec<String> = values
            .iter()
            .map(|value| match value {
                FieldValue::Numeric(n) => format!("#{}", n),
                FieldValue::Text(t) => format!("'{}'", t),
            })
            .collect();
        record(&self.log, format!("select {} {}", field.name, rendered.join(",")));
        Ok(true)
    }

    async fn object(&self, id: &str) -> EngineResult<MockObject> {
        if !self.script.has_object(id) {
            return Err(EngineError::ObjectNotFound { id: id.to_string() });
        }
        Ok(MockObject {
            id: id.to_string(),
            script: self.script.clone(),
            log: self.log.clone(),
        })
    }

    async fn close(self) -> EngineResult<()> {
        record(&self.log, format!("close_app {}", self.app_id));
        Ok(())
    }
}

pub struct MockObject {
    id: String,
    script: Arc<Script>,
    log: CallLog,
}

#[async_trait]
impl GenericObject for MockObject {
    fn id(&self) -> &str {
        &self.id
    }

    async fn child_ids(&self) -> EngineResult<Vec<String>> {
        Ok(self.script.sheets.get(&self.id).cloned().unwrap_or_default())
    }

    async fn layout(&self) -> EngineResult<JsonValue> {
        tokio::task::yield_now().await;
        if self.script.slow_objects.contains(&self.id) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        record(&self.log, format!("layout {}", self.id));
        if self.script.failing_objects.contains(&self.id) {
            return Err(EngineError::Rpc {
                method: "GetLayout".into(),
                code: -128,
                message: "calculation aborted".into(),
            });
        }
        Ok(json!({ "qInfo": { "qId": self.id } }))
    }
}

/// 记录下来的报告事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Unparsed(String),
    NodeStarted(String, usize),
    NodeSkipped(String),
    NodeCompleted(String),
    AppStarted(Option<String>),
    AppSkipped(Option<String>),
    ConfigurationsApplying(usize),
    SelectionApplying(String, usize),
    WarmingStarted(usize),
    WarmingDone(usize, usize),
    ConfigurationFailed(usize, String),
    AppCompleted(String),
    Cancelled,
}

/// 记录事件的报告器，可以在第 N 次预热完成后触发取消
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
    cancel_after: Mutex<Option<(usize, CancelToken)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(warmed: usize, token: CancelToken) -> Self {
        Self {
            events: Mutex::default(),
            cancel_after: Mutex::new(Some((warmed, token))),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl WarmReporter for RecordingReporter {
    fn configuration_unparsed(&self, source: &str, _error: &ParseError) {
        self.push(Event::Unparsed(source.to_string()));
    }

    fn node_started(&self, node: &NodeKey, configurations: usize) {
        self.push(Event::NodeStarted(node.to_string(), configurations));
    }

    fn node_skipped(&self, node: &NodeKey, _error: &EngineError) {
        self.push(Event::NodeSkipped(node.to_string()));
    }

    fn node_completed(&self, node: &NodeKey) {
        self.push(Event::NodeCompleted(node.to_string()));
    }

    fn app_started(&self, app_id: Option<&str>) {
        self.push(Event::AppStarted(app_id.map(str::to_string)));
    }

    fn app_skipped(&self, app_id: Option<&str>, _reason: &str) {
        self.push(Event::AppSkipped(app_id.map(str::to_string)));
    }

    fn configurations_applying(&self, count: usize) {
        self.push(Event::ConfigurationsApplying(count));
    }

    fn selection_applying(&self, field: &str, values: usize) {
        self.push(Event::SelectionApplying(field.to_string(), values));
    }

    fn warming_started(&self, ctx: &ConfigurationCtx) {
        self.push(Event::WarmingStarted(ctx.index));
    }

    fn warming_done(&self, ctx: &ConfigurationCtx, report: &WarmReport) {
        self.push(Event::WarmingDone(ctx.index, report.objects));

        let done = self
            .events()
            .iter()
            .filter(|event| matches!(event, Event::WarmingDone(..)))
            .count();
        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if done >= *after {
                token.cancel();
            }
        }
    }

    fn configuration_failed(&self, ctx: &ConfigurationCtx, error: &AppError) {
        self.push(Event::ConfigurationFailed(ctx.index, error.to_string()));
    }

    fn app_completed(&self, app_id: &str) {
        self.push(Event::AppCompleted(app_id.to_string()));
    }

    fn cancelled(&self) {
        self.push(Event::Cancelled);
    }
}
