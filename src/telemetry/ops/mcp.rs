use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Mcp;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Serve, Call, Connect, Save }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Serve => "serve", Phase::Call => "call", Phase::Connect => "connect", Phase::Save => "save" } }
    fn span(&self) -> Span { match self { Phase::Serve => info_span!("serve"), Phase::Call => info_span!("call"), Phase::Connect => info_span!("connect"), Phase::Save => info_span!("save") } }
}

impl OpMarker for Mcp {
    const NAME: &'static str = "mcp";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("mcp") }
}
