use futures::future::join_all;
use tracing::Instrument;

use crate::llm::{ChatCompletionRequest, ChatMessage, ChatRole, LlmClient};
use crate::telemetry::{self};
use crate::telemetry::ops::digest::Phase as DigestPhase;

use super::chunk::EntryBatch;
use super::prompt::{build_prompt, SYSTEM_PROMPT};

const SUMMARY_TEMPERATURE: f32 = 0.5;
// room for a full batch of detailed multi-paragraph summaries
const SUMMARY_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Success(String),
    Failure(String),
}

/// The outcome of one batch, tagged with the batch's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    pub index: usize,
    pub outcome: ChunkOutcome,
}

impl ChunkResult {
    /// A success whose text is not blank; only these reach the report.
    pub fn has_text(&self) -> bool {
        matches!(&self.outcome, ChunkOutcome::Success(text) if !text.trim().is_empty())
    }
}

/// Fixed per-run parameters shared by every chunk request.
#[derive(Debug, Clone)]
pub struct SummarizeSettings {
    pub model: String,
    pub endpoint: String,
    pub language: String,
}

/// Fan out one request per batch against the shared client and wait for all
/// of them. A failed call only affects its own batch.
pub async fn summarize_batches(
    client: &dyn LlmClient,
    batches: &[EntryBatch<'_>],
    settings: &SummarizeSettings,
) -> Vec<ChunkResult> {
    let log = telemetry::digest();
    let span = log.span_kv(&DigestPhase::Summarize, [("chunks", batches.len().to_string()), ("model", settings.model.clone())]);
    join_all(batches.iter().map(|batch| summarize_batch(client, batch, settings)))
        .instrument(span)
        .await
}

async fn summarize_batch(client: &dyn LlmClient, batch: &EntryBatch<'_>, settings: &SummarizeSettings) -> ChunkResult {
    let log = telemetry::digest();
    let (n, total) = (batch.index + 1, batch.total);
    log.info_kv(
        &format!("🧠 chunk {n}/{total} → {} ({})", settings.endpoint, settings.model),
        [("chunk", n.to_string()), ("entries", batch.entries.len().to_string())],
    );

    let request = ChatCompletionRequest {
        model: Some(settings.model.clone()),
        messages: vec![
            ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
            ChatMessage::new(ChatRole::User, build_prompt(batch, &settings.language)),
        ],
        max_tokens: Some(SUMMARY_MAX_TOKENS),
        temperature: Some(SUMMARY_TEMPERATURE),
    };

    let span = log.span_kv(&DigestPhase::Chunk, [("index", batch.index.to_string())]);
    let outcome = match client.chat_completion(request).instrument(span).await {
        Ok(resp) => {
            if let Some(usage) = &resp.usage {
                log.debug(format!("chunk {n}/{total} usage: {:?} tokens", usage.total_tokens));
            }
            log.event("chunk_done");
            ChunkOutcome::Success(resp.content)
        }
        Err(err) => {
            log.warn_kv(&format!("❌ chunk {n}/{total} failed: {err}"), [("chunk", n.to_string()), ("error", err.to_string())]);
            log.event("chunk_failed");
            ChunkOutcome::Failure(err.to_string())
        }
    };
    ChunkResult { index: batch.index, outcome }
}
