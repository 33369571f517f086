#![cfg(feature = "mcp-server")]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rmcp::{
    ServiceExt,
    model::CallToolRequestParam,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use tokio::process::Command;
use tracing::Instrument;

use crate::config::ReportConfig;
use crate::mcp::tools::{result_text, GENERATE_REPORT_TOOL};
use crate::report::Report;
use crate::telemetry;
use crate::telemetry::ops::mcp::Phase as McpPhase;

#[derive(Debug, Args, Default)]
#[command(about = "Spawn the digest MCP server, request a report, and save it")]
pub struct ClientCmd {
    /// Server executable (defaults to this binary)
    #[arg(long)]
    pub server_cmd: Option<PathBuf>,
    /// Argument passed to the server; repeatable (defaults to `serve`)
    #[arg(long = "server-arg")]
    pub server_args: Vec<String>,
    /// Directory the dated report is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl ClientCmd {
    fn server_command(&self) -> Result<(PathBuf, Vec<String>)> {
        let program = match &self.server_cmd {
            Some(p) => p.clone(),
            None => std::env::current_exe().context("locate current executable")?,
        };
        let args = if self.server_args.is_empty() { vec!["serve".to_string()] } else { self.server_args.clone() };
        Ok((program, args))
    }
}

pub async fn run_client(cmd: ClientCmd, mut report_cfg: ReportConfig) -> Result<()> {
    let log = telemetry::mcp();
    if let Some(dir) = &cmd.output_dir {
        report_cfg.output_dir = dir.clone();
    }
    let (program, args) = cmd.server_command()?;

    log.info_kv("🚀 starting digest MCP server", [("program", program.display().to_string()), ("args", args.join(" "))]);
    let service = async {
        let transport = TokioChildProcess::new(Command::new(&program).configure(|c| {
            c.args(&args);
        }))
        .context("spawn MCP server process")?;
        ().serve(transport).await.context("initialize MCP session")
    }
    .instrument(log.span(&McpPhase::Connect))
    .await?;
    log.info("✅ connected, requesting report");

    let outcome = service
        .call_tool(CallToolRequestParam { name: GENERATE_REPORT_TOOL.into(), arguments: None })
        .instrument(log.span_kv(&McpPhase::Call, [("tool", GENERATE_REPORT_TOOL.to_string())]))
        .await;
    if let Err(err) = service.cancel().await {
        log.warn(format!("MCP session did not shut down cleanly: {err}"));
    }
    let result = outcome.with_context(|| format!("call {GENERATE_REPORT_TOOL}"))?;

    let text = result_text(&result);
    if result.is_error == Some(true) {
        log.error(format!("server could not produce a report: {text}"));
        bail!("{GENERATE_REPORT_TOOL} failed: {text}");
    }

    let path = Report::today(text)
        .write(&report_cfg)
        .instrument(log.span(&McpPhase::Save))
        .await?;
    log.info(format!("✅ report saved to {}", path.display()));
    Ok(())
}
