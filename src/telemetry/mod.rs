pub mod config;
pub mod ctx;
pub mod ops;
pub mod sink;

use std::marker::PhantomData;

use ctx::LogCtx;

pub use sink::{current_sink, install_sink, EventPayload, OutputSink, SinkGuard};

// Factory helpers, one per top-level operation
pub fn digest() -> LogCtx<ops::digest::Digest> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
pub fn mcp() -> LogCtx<ops::mcp::Mcp> { LogCtx { json: config::logs_are_json(), _marker: PhantomData } }
