use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{info, debug, warn, error, Span};

use crate::output::types::{Envelope, Meta};

use super::sink::{current_sink, EventPayload};

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            debug!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            debug!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }
    pub fn error(&self, msg: impl AsRef<str>) { if self.json { error!(op = %self.op_name(), "{}", msg.as_ref()); } else { error!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn debug_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); debug!(op = %self.op_name(), details = %details, "{}", msg); }
        else { debug!("{}", msg); }
    }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); warn!(op = %self.op_name(), details = %details, "{}", msg); }
        else { warn!("{}", msg); }
    }

    /// Route a plan envelope to the installed sink.
    pub fn plan<T: Serialize>(&self, plan: &T, meta: Option<Meta>) -> Result<()> {
        let env = Envelope::plan(self.op_name(), plan, meta)?;
        current_sink().on_plan(&env)
    }

    /// Route a result envelope to the installed sink.
    pub fn result<T: Serialize>(&self, result: &T, meta: Option<Meta>) -> Result<()> {
        let env = Envelope::result(self.op_name(), result, meta)?;
        current_sink().on_result(&env)
    }

    /// Progress marker; ignored by the stdout sink, relayed by the MCP sink.
    pub fn event(&self, kind: &str) {
        let payload = EventPayload { kind, op: self.op_name() };
        if let Err(err) = current_sink().on_event(&payload) {
            debug!(op = %self.op_name(), error = %err, "event sink failed");
        }
    }
}

// Digest-specific helpers remain available on the typed context
impl LogCtx<crate::telemetry::ops::digest::Digest> {
    pub fn source_summary(&self, source: &str, fetched: usize, kept: usize) {
        if self.json { info!(op = %self.op_name(), source, fetched, kept, "source_summary"); }
        else { info!("✅ {} — fetched={} kept={}", source, fetched, kept); }
    }

    pub fn source_failed(&self, source: &str, reason: &str) {
        if self.json { warn!(op = %self.op_name(), source, reason, "source_failed"); }
        else { warn!("❌ {} — fetch failed: {}", source, reason); }
    }

    pub fn totals(&self, entries: usize, chunks: usize, succeeded: usize, failed: usize) {
        if self.json { info!(op = %self.op_name(), entries, chunks, succeeded, failed, "digest_totals"); }
        else { info!("📊 Digest totals — entries={} chunks={} succeeded={} failed={}", entries, chunks, succeeded, failed); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pairs_render_in_order() {
        let s = kv_to_string([("chunk", "1".to_string()), ("of", "3".to_string())]);
        assert_eq!(s, "chunk=1 of=3");
    }

    #[test]
    fn empty_kv_renders_empty() {
        let s = kv_to_string(std::iter::empty::<(&str, String)>());
        assert!(s.is_empty());
    }
}
