use std::sync::{Arc, Mutex, OnceLock};

use anyhow::Result;

use crate::output::config::OutputConfig;
use crate::output::Emitter;
use crate::output::types::Envelope;

/// Lightweight progress marker (e.g. `chunk_done`, `chunk_failed`).
#[derive(Debug)]
pub struct EventPayload<'a> {
    pub kind: &'a str,
    pub op: &'a str,
}

/// Destination for plan/result envelopes and progress markers.
pub trait OutputSink: Send + Sync {
    fn on_plan(&self, env: &Envelope) -> Result<()>;
    fn on_result(&self, env: &Envelope) -> Result<()>;

    fn on_event(&self, _event: &EventPayload<'_>) -> Result<()> {
        Ok(())
    }
}

/// Default sink. Prints envelopes only for `--json` runs.
#[derive(Default)]
pub struct StdoutSink;

impl StdoutSink {
    fn print(&self, env: &Envelope) -> Result<()> {
        match Emitter::when_enabled(super::config::json_mode(), OutputConfig::from_env()) {
            Some(emitter) => Ok(emitter.emit(env)?),
            None => Ok(()),
        }
    }
}

impl OutputSink for StdoutSink {
    fn on_plan(&self, env: &Envelope) -> Result<()> { self.print(env) }
    fn on_result(&self, env: &Envelope) -> Result<()> { self.print(env) }
}

type DynSink = Arc<dyn OutputSink>;

// The MCP server swaps in its own sink for the lifetime of the transport;
// stdout then belongs to the protocol and StdoutSink is never reached.
fn slot() -> &'static Mutex<DynSink> {
    static SINK: OnceLock<Mutex<DynSink>> = OnceLock::new();
    SINK.get_or_init(|| Mutex::new(Arc::new(StdoutSink)))
}

fn swap(next: DynSink) -> DynSink {
    let mut guard = slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    std::mem::replace(&mut *guard, next)
}

pub fn current_sink() -> DynSink {
    slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

/// Puts the previous sink back on drop.
pub struct SinkGuard {
    previous: Option<DynSink>,
}

pub fn install_sink(sink: DynSink) -> SinkGuard {
    SinkGuard { previous: Some(swap(sink)) }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            swap(previous);
        }
    }
}

/// Serializes tests that swap the process-wide sink.
#[cfg(test)]
pub(crate) fn exclusive_sink() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
