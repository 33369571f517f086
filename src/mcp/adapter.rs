#![cfg(feature = "mcp-server")]

use std::sync::Mutex;

use anyhow::Result;
use serde_json::{json, Value};

use rmcp::model::{LoggingLevel, LoggingMessageNotificationParam};

use crate::output::types::{Envelope, Meta};
use crate::telemetry::{EventPayload, OutputSink};

#[derive(Debug, Clone, PartialEq)]
pub enum McpMessageKind {
    Plan,
    Result,
    Event(String),
}

/// One envelope or progress marker captured during a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMessage {
    pub kind: McpMessageKind,
    pub op: String,
    pub run_id: Option<String>,
    pub payload: Value,
}

/// Collects everything the pipeline emits while a tool call runs, so the
/// server can relay it to the peer as logging notifications.
#[derive(Default, Debug)]
pub struct McpSink {
    messages: Mutex<Vec<CapturedMessage>>,
}

impl McpSink {
    pub fn new() -> Self { Self::default() }

    pub fn drain(&self) -> Vec<CapturedMessage> {
        let mut guard = self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }

    fn capture(&self, message: CapturedMessage) {
        let mut guard = self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(message);
    }

    fn run_id(meta: &Option<Meta>) -> Option<String> {
        meta.as_ref().and_then(|m| m.run_id.clone())
    }

    fn capture_envelope(&self, kind: McpMessageKind, key: &str, body: Option<&Value>, env: &Envelope) {
        let mut payload = json!({
            "schema_version": env.schema_version,
            "op": env.op,
        });
        payload[key] = body.cloned().unwrap_or(Value::Null);
        self.capture(CapturedMessage {
            kind,
            op: env.op.to_string(),
            run_id: Self::run_id(&env.meta),
            payload,
        });
    }
}

impl CapturedMessage {
    pub fn into_logging_notification(self) -> LoggingMessageNotificationParam {
        let CapturedMessage { kind, op, run_id, payload } = self;

        let (level, kind_label) = match &kind {
            McpMessageKind::Plan => (LoggingLevel::Info, "plan"),
            McpMessageKind::Result => (LoggingLevel::Notice, "result"),
            McpMessageKind::Event(label) => (LoggingLevel::Debug, label.as_str()),
        };

        let logger = if op.is_empty() { "digest".to_string() } else { format!("digest::{op}") };

        let mut data = payload;
        match &mut data {
            Value::Object(map) => {
                map.insert("message_kind".to_string(), Value::String(kind_label.to_string()));
                if let Some(run_id) = run_id {
                    map.entry("run_id".to_string()).or_insert(Value::String(run_id));
                }
            }
            _ => {
                data = json!({ "message_kind": kind_label, "payload": data, "run_id": run_id });
            }
        }

        LoggingMessageNotificationParam { level, logger: Some(logger), data }
    }
}

impl OutputSink for McpSink {
    fn on_plan(&self, env: &Envelope) -> Result<()> {
        self.capture_envelope(McpMessageKind::Plan, "plan", env.plan.as_ref(), env);
        Ok(())
    }

    fn on_result(&self, env: &Envelope) -> Result<()> {
        self.capture_envelope(McpMessageKind::Result, "result", env.result.as_ref(), env);
        Ok(())
    }

    fn on_event(&self, event: &EventPayload<'_>) -> Result<()> {
        self.capture(CapturedMessage {
            kind: McpMessageKind::Event(event.kind.to_string()),
            op: event.op.to_string(),
            run_id: None,
            payload: json!({ "kind": event.kind, "op": event.op }),
        });
        Ok(())
    }
}
