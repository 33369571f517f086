//! Fetch → plan → summarize → assemble.
//!
//! Source and chunk failures are absorbed per unit; the run as a whole only
//! fails when there is nothing to summarize or nothing survived summarizing.

pub mod assemble;
pub mod chunk;
pub mod error;
pub mod prompt;
pub mod summarize;

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::config::DigestConfig;
use crate::feed::{self, FeedSource, SourceOutcome};
use crate::llm::LlmClient;
use crate::output::types::Meta;
use crate::report::Report;
use crate::telemetry::{self};
use crate::telemetry::ops::digest::Phase as DigestPhase;

pub use error::DigestError;

use self::assemble::assemble_body;
use self::chunk::{plan_batches, BatchPlan};
use self::summarize::{summarize_batches, SummarizeSettings};

/// Structured summary of one run (result envelope payload).
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub entries: usize,
    pub chunk_size: usize,
    pub chunks: usize,
    pub chunks_ok: usize,
    pub chunks_failed: usize,
    pub sources: Vec<SourceOutcome>,
}

#[derive(Debug, Clone)]
pub struct DigestOutcome {
    pub run_id: Uuid,
    pub report: Report,
    pub summary: RunSummary,
}

/// Run the whole pipeline once and return the assembled report.
pub async fn run_digest(
    feeds: &dyn FeedSource,
    llm: &dyn LlmClient,
    cfg: &DigestConfig,
) -> Result<DigestOutcome, DigestError> {
    let log = telemetry::digest();
    let started = Instant::now();
    let run_id = Uuid::new_v4();

    if cfg.llm.usable_api_key().is_none() {
        log.error("❌ OPENAI_API_KEY is not set; nothing fetched");
        return Err(DigestError::MissingApiKey);
    }

    let agg = feed::aggregate_entries(feeds, &cfg.feeds, cfg.max_items_per_feed).await;
    if agg.entries.is_empty() {
        log.error("❌ No news entries fetched; no report generated");
        return Err(DigestError::NoEntries { sources: cfg.feeds.len() });
    }
    log.info(format!(
        "📊 {} entries from {} source(s) ({} failed)",
        agg.entries.len(),
        agg.sources.len(),
        agg.failed_sources()
    ));

    let batches = {
        let _s = log.span(&DigestPhase::Plan).entered();
        let batches = plan_batches(&agg.entries, cfg.chunk_size);
        log.info(format!("   - split into {} chunk(s) of up to {} entries", batches.len(), cfg.chunk_size));
        batches
    };

    let settings = SummarizeSettings {
        model: cfg.llm.default_model.clone(),
        endpoint: cfg.llm.base_url.clone(),
        language: cfg.language.clone(),
    };
    let results = summarize_batches(llm, &batches, &settings).await;

    let chunks_ok = results.iter().filter(|r| r.has_text()).count();
    let chunks_failed = results.len() - chunks_ok;
    let summary = RunSummary {
        entries: agg.entries.len(),
        chunk_size: cfg.chunk_size,
        chunks: batches.len(),
        chunks_ok,
        chunks_failed,
        sources: agg.sources,
    };
    log.totals(summary.entries, summary.chunks, chunks_ok, chunks_failed);

    let body = {
        let _s = log.span(&DigestPhase::Assemble).entered();
        assemble_body(results)
    };
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            log.error(format!("❌ {err}"));
            return Err(err);
        }
    };

    let meta = Meta { duration_ms: Some(started.elapsed().as_millis()), run_id: Some(run_id.to_string()) };
    if let Err(err) = log.result(&summary, Some(meta)) {
        log.warn(format!("failed to emit run summary: {err:#}"));
    }
    log.info("✅ All chunks processed, report assembled");
    Ok(DigestOutcome { run_id, report: Report::today(body), summary })
}

/// Fetch and plan only; no LLM calls and no credential needed.
pub async fn plan_digest(feeds: &dyn FeedSource, cfg: &DigestConfig) -> Result<BatchPlan, DigestError> {
    let agg = feed::aggregate_entries(feeds, &cfg.feeds, cfg.max_items_per_feed).await;
    if agg.entries.is_empty() {
        return Err(DigestError::NoEntries { sources: cfg.feeds.len() });
    }
    let batches = plan_batches(&agg.entries, cfg.chunk_size);
    Ok(BatchPlan::from_batches(agg.entries.len(), cfg.chunk_size, &batches))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSpec;
    use crate::feed::stub::StaticFeedSource;
    use std::sync::{Arc, Mutex};

    use crate::llm::{MockClient, OpenAiError};
    use crate::output::types::Envelope;
    use crate::telemetry::{install_sink, OutputSink};

    #[derive(Default)]
    struct CaptureSink {
        results: Mutex<Vec<Envelope>>,
    }

    impl OutputSink for CaptureSink {
        fn on_plan(&self, _env: &Envelope) -> anyhow::Result<()> { Ok(()) }

        fn on_result(&self, env: &Envelope) -> anyhow::Result<()> {
            self.results.lock().unwrap().push(env.clone());
            Ok(())
        }
    }

    fn config(feeds: &[&str]) -> DigestConfig {
        let mut cfg = DigestConfig::default();
        cfg.feeds = feeds.iter().map(|n| FeedSpec::new(*n, format!("https://{n}.example/rss"))).collect();
        cfg.llm.api_key = Some("sk-test".into());
        cfg
    }

    #[tokio::test]
    async fn one_source_failing_still_yields_single_batch_report() {
        let cfg = config(&["a", "b", "c"]);
        let feeds = StaticFeedSource::new()
            .with_items("https://a.example/rss", 10)
            .with_error("https://b.example/rss", "dns failure")
            .with_items("https://c.example/rss", 5);
        let llm = MockClient::new();
        llm.push_text("### Big news\n- **source**: a");

        let outcome = run_digest(&feeds, &llm, &cfg).await.unwrap();
        assert_eq!(outcome.summary.entries, 15);
        assert_eq!(outcome.summary.chunks, 1);
        assert_eq!(llm.calls().len(), 1);
        assert_eq!(outcome.report.body, "### Big news\n- **source**: a");
        assert_eq!(outcome.summary.sources[1].error.as_deref(), Some("dns failure"));
    }

    #[tokio::test]
    async fn failed_middle_chunk_is_left_out() {
        let cfg = config(&["a", "b"]);
        let feeds = StaticFeedSource::new()
            .with_items("https://a.example/rss", 40)
            .with_items("https://b.example/rss", 20);
        let llm = MockClient::new();
        llm.push_text("call-1");
        llm.push_response(Err(OpenAiError::Timeout));
        llm.push_text("call-3");

        let outcome = run_digest(&feeds, &llm, &cfg).await.unwrap();
        assert_eq!(llm.calls().len(), 3);
        assert_eq!(outcome.summary.chunks_ok, 2);
        assert_eq!(outcome.summary.chunks_failed, 1);
        assert_eq!(outcome.report.body, "call-1\n\ncall-3");
    }

    #[tokio::test]
    async fn no_entries_means_no_llm_calls() {
        let cfg = config(&["a", "b"]);
        let feeds = StaticFeedSource::new()
            .with_error("https://a.example/rss", "503")
            .with_error("https://b.example/rss", "timeout");
        let llm = MockClient::new();

        let err = run_digest(&feeds, &llm, &cfg).await.unwrap_err();
        assert!(matches!(err, DigestError::NoEntries { sources: 2 }));
        assert!(err.to_string().starts_with("fetch stage"));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_key_stops_before_fetching() {
        for key in [None, Some("YOUR_OPENAI_API_KEY_HERE".to_string())] {
            let mut cfg = config(&["a"]);
            cfg.llm.api_key = key;
            let feeds = StaticFeedSource::new().with_items("https://a.example/rss", 3);
            let llm = MockClient::new();

            let err = run_digest(&feeds, &llm, &cfg).await.unwrap_err();
            assert!(matches!(err, DigestError::MissingApiKey));
            assert!(err.to_string().starts_with("configuration error"));
            assert!(feeds.requested().is_empty());
            assert!(llm.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn every_chunk_failing_is_terminal() {
        let cfg = config(&["a"]);
        let feeds = StaticFeedSource::new().with_items("https://a.example/rss", 30);
        let llm = MockClient::new();
        llm.push_response(Err(OpenAiError::Timeout));
        llm.push_response(Err(OpenAiError::MissingApiKey));

        let err = run_digest(&feeds, &llm, &cfg).await.unwrap_err();
        assert!(matches!(err, DigestError::NoUsableOutput { chunks: 2, failed: 2 }));
    }

    #[tokio::test]
    async fn single_batch_mode_sends_one_request() {
        let mut cfg = config(&["a", "b"]);
        cfg.chunk_size = usize::MAX;
        let feeds = StaticFeedSource::new()
            .with_items("https://a.example/rss", 40)
            .with_items("https://b.example/rss", 40);
        let llm = MockClient::new();
        llm.push_text("everything");

        let outcome = run_digest(&feeds, &llm, &cfg).await.unwrap();
        assert_eq!(llm.calls().len(), 1);
        assert_eq!(outcome.summary.entries, 80);
        assert_eq!(outcome.report.body, "everything");
    }

    #[tokio::test]
    async fn plan_reports_batch_sizes_without_credentials() {
        let mut cfg = config(&["a", "b"]);
        cfg.llm.api_key = None;
        let feeds = StaticFeedSource::new()
            .with_items("https://a.example/rss", 100)
            .with_items("https://b.example/rss", 10);

        let plan = plan_digest(&feeds, &cfg).await.unwrap();
        assert_eq!(plan.entries, 85);
        assert_eq!(plan.batch_sizes, vec![25, 25, 25, 10]);
    }

    #[tokio::test]
    async fn blank_chunk_counts_as_failed_in_totals() {
        let cfg = config(&["a"]);
        let feeds = StaticFeedSource::new().with_items("https://a.example/rss", 30);
        let llm = MockClient::new();
        llm.push_text("kept");
        llm.push_text(" \n ");

        let outcome = run_digest(&feeds, &llm, &cfg).await.unwrap();
        assert_eq!(outcome.summary.chunks_ok, 1);
        assert_eq!(outcome.summary.chunks_failed, 1);
        assert_eq!(outcome.report.body, "kept");
    }

    #[tokio::test]
    async fn only_blank_output_fails_with_every_chunk_counted() {
        let cfg = config(&["a"]);
        let feeds = StaticFeedSource::new().with_items("https://a.example/rss", 5);
        let llm = MockClient::new();
        llm.push_text("\n\n");

        let err = run_digest(&feeds, &llm, &cfg).await.unwrap_err();
        assert!(matches!(err, DigestError::NoUsableOutput { chunks: 1, failed: 1 }));
    }

    #[tokio::test]
    async fn result_envelope_carries_run_id_and_duration() {
        let _lock = crate::telemetry::sink::exclusive_sink();
        let sink = Arc::new(CaptureSink::default());
        let guard = install_sink(sink.clone());

        let cfg = config(&["a"]);
        let feeds = StaticFeedSource::new().with_items("https://a.example/rss", 3);
        let llm = MockClient::new();
        llm.push_text("body");
        let outcome = run_digest(&feeds, &llm, &cfg).await.unwrap();
        drop(guard);

        let results = sink.results.lock().unwrap();
        let run_id = outcome.run_id.to_string();
        let env = results
            .iter()
            .find(|e| e.meta.as_ref().and_then(|m| m.run_id.as_deref()) == Some(run_id.as_str()))
            .expect("result envelope for this run");
        assert_eq!(env.op, "digest");
        assert!(env.apply);
        assert!(env.meta.as_ref().unwrap().duration_ms.is_some());
        assert_eq!(env.result.as_ref().unwrap()["chunks_ok"], 1);
    }
}
