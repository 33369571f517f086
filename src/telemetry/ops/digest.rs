use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Digest;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Fetch, Source, Plan, Summarize, Chunk, Assemble, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Fetch => "fetch",
        Phase::Source => "source",
        Phase::Plan => "plan",
        Phase::Summarize => "summarize",
        Phase::Chunk => "chunk",
        Phase::Assemble => "assemble",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::Fetch => info_span!("fetch"),
        Phase::Source => info_span!("source"),
        Phase::Plan => info_span!("plan"),
        Phase::Summarize => info_span!("summarize"),
        Phase::Chunk => info_span!("chunk"),
        Phase::Assemble => info_span!("assemble"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for Digest {
    const NAME: &'static str = "digest";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("digest") }
}
