use std::time::Instant;

use anyhow::Result;
use clap::Args;
use tracing::Instrument;

use crate::config::{DigestArgs, DigestConfig};
use crate::feed::HttpFeedSource;
use crate::llm::OpenAiClient;
use crate::output::types::Meta;
use crate::pipeline::{self, DigestError};
use crate::telemetry;
use crate::telemetry::ops::digest::Phase as DigestPhase;

#[derive(Args, Debug, Default)]
#[command(about = "Fetch feeds, summarize with the LLM, and write today's report")]
pub struct RunCmd {
    #[command(flatten)]
    pub digest: DigestArgs,
    /// Fetch and plan batches only; no LLM calls, no file written
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run(args: RunCmd) -> Result<()> {
    let mut cfg = DigestConfig::from_env()?;
    cfg.apply_args(&args.digest)?;

    let log = telemetry::digest();
    let root = log.root_span_kv([
        ("feeds", cfg.feeds.len().to_string()),
        ("chunk_size", cfg.chunk_size.to_string()),
        ("model", cfg.llm.default_model.clone()),
        ("dry_run", args.dry_run.to_string()),
    ]);

    execute(args.dry_run, &cfg).instrument(root).await
}

async fn execute(dry_run: bool, cfg: &DigestConfig) -> Result<()> {
    let log = telemetry::digest();
    let feeds = HttpFeedSource::new()?;

    if dry_run {
        let started = Instant::now();
        let plan = pipeline::plan_digest(&feeds, cfg).await?;
        log.info(format!(
            "📝 Plan: {} entries in {} batch(es) {:?}",
            plan.entries,
            plan.batch_sizes.len(),
            plan.batch_sizes
        ));
        log.plan(&plan, Some(Meta { duration_ms: Some(started.elapsed().as_millis()), run_id: None }))?;
        return Ok(());
    }

    let llm = OpenAiClient::new(cfg.llm.clone()).map_err(DigestError::Client)?;
    let outcome = pipeline::run_digest(&feeds, &llm, cfg).await?;

    let path = outcome
        .report
        .write(&cfg.report)
        .instrument(log.span(&DigestPhase::Write))
        .await?;
    log.info_kv(
        &format!("✅ Report written to {}", path.display()),
        [("run_id", outcome.run_id.to_string())],
    );
    Ok(())
}
